use regex::Regex;
use serde::Serialize;

pub const IDEA: &str = "아이디어/아이템";
pub const PHILOSOPHY: &str = "개인 철학";
pub const CONCERN: &str = "개인적 고민";
pub const LEARNING: &str = "학습+느낀점";

pub const CATEGORY_TAG: &str = "Category:";

const MARKUP_PATTERN: &str = r"<[^>]+>";

const HARD_EXCLUDE: &[&str] = &[
    "살거", "사기", "쇼핑", "주문", "배송", "택배", "결제", "인터넷신청", "전화번호", "주소",
    "비밀번호", "냉장고", "세탁기", "청소", "설거지", "옷장", "침대", "매트리스", "ok", "완료",
    "체크", "확인", "맵코드", "공항", "항공", "호텔", "숙소", "렌트", "예산",
];

const STRICT_ONLY_EXCLUDE: &[&str] = &[
    "예약", "정리", "할일", "할거", "사야될", "갈곳", "볼것", "볼거",
];

const STRONG_IDEA: &[&str] = &[
    "사업 아이디어", "창업", "플랫폼", "서비스 구축", "앱 개발", "비즈니스 모델", "수익화",
    "스타트업", "프로젝트",
];

const BROAD_IDEA: &[&str] = &[
    "아이디어", "아이템", "창업", "사업", "어플", "앱", "웹사이트", "서비스", "프로젝트",
    "플랫폼", "솔루션", "비즈니스", "스타트업", "개발", "구축", "제작", "만들", "sdk", "api",
    "시스템", "포트폴리오", "면접", "이직", "입사", "지원", "포폴", "기술스택",
];

const DEEP_THOUGHT: &[&str] = &[
    "이유", "철학", "가치관", "인생", "도전", "성장", "배움", "깨달음", "반성", "고민", "결정",
    "선택", "방향", "목표", "의미", "왜", "어떻게", "나는", "생각하는", "느낀",
];

const CONCERN_WORDS: &[&str] = &[
    "고민", "걱정", "불안", "선택", "결정", "어려움", "위험", "도전",
];

const INSIGHT_WORDS: &[&str] = &["배운", "깨달은", "느낀", "이해", "알게된", "경험"];

const TECH_WORDS: &[&str] = &[
    "개발", "코딩", "typescript", "react", "vue", "api", "backend", "frontend",
];

const LENIENT_EXCLUDE: &[&str] = &[
    "살거", "사기", "쇼핑", "주문", "배송", "택배", "결제", "인터넷신청", "전화번호", "주소",
    "비밀번호", "냉장고", "세탁기", "청소", "설거지", "옷장", "침대", "매트리스", "ok", "완료",
    "체크", "확인",
];

const LENIENT_IDEA: &[&str] = &[
    "아이디어", "아이템", "창업", "사업", "어플", "앱", "웹사이트", "서비스", "프로젝트",
    "플랫폼", "솔루션", "비즈니스", "스타트업",
];

const LENIENT_PHILOSOPHY: &[&str] = &[
    "생각", "철학", "인생", "가치", "의미", "목표", "꿈", "비전", "성공", "실패", "행복", "관계",
    "사랑", "자유", "성장", "무엇을", "왜", "어떻게", "나는",
];

const LENIENT_CONCERN: &[&str] = &[
    "고민", "걱정", "불안", "두려움", "선택", "결정", "갈등", "어려움", "문제", "위험", "도전",
    "한계", "방향",
];

const LENIENT_LEARNING: &[&str] = &[
    "배운", "깨달은", "느낀", "알게된", "이해", "공부", "학습", "책", "강의", "튜토리얼", "정리",
    "요약", "리뷰", "개발", "코딩", "programming", "algorithm", "framework",
];

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|word| word.to_lowercase()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMode {
    Weighted,
    Membership,
}

#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub label: String,
    pub keywords: Vec<String>,
    pub min_hits: usize,
    pub min_chars: usize,
    pub weight: f64,
    pub requires_any: Vec<String>,
    pub relaxes_floor: bool,
}

impl CategoryRule {
    pub fn new(label: &str, keywords: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            keywords: words(keywords),
            min_hits: 1,
            min_chars: 0,
            weight: 1.0,
            requires_any: Vec::new(),
            relaxes_floor: false,
        }
    }

    pub fn min_hits(mut self, value: usize) -> Self {
        self.min_hits = value;
        self
    }

    pub fn min_chars(mut self, value: usize) -> Self {
        self.min_chars = value;
        self
    }

    pub fn weight(mut self, value: f64) -> Self {
        self.weight = value;
        self
    }

    pub fn requires_any(mut self, keywords: &[&str]) -> Self {
        self.requires_any = words(keywords);
        self
    }

    pub fn relaxes_floor(mut self) -> Self {
        self.relaxes_floor = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExcludeOverride {
    Never,
    Keywords { keywords: Vec<String>, min_hits: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreFloor {
    pub default: f64,
    pub relaxed: f64,
}

#[derive(Debug, Clone)]
pub struct ClassifierPolicy {
    pub name: String,
    pub exclude: Vec<String>,
    pub exclude_override: ExcludeOverride,
    pub min_body_chars: usize,
    pub min_text_chars: Option<usize>,
    pub rules: Vec<CategoryRule>,
    pub mode: ScoreMode,
    pub floor: Option<ScoreFloor>,
    pub question_fallback: Option<String>,
}

impl ClassifierPolicy {
    pub fn strict() -> Self {
        let mut exclude = words(HARD_EXCLUDE);
        exclude.extend(words(STRICT_ONLY_EXCLUDE));

        Self {
            name: "strict".to_string(),
            exclude,
            exclude_override: ExcludeOverride::Never,
            min_body_chars: 200,
            min_text_chars: Some(100),
            rules: introspective_rules(CategoryRule::new(IDEA, STRONG_IDEA).min_chars(300)),
            mode: ScoreMode::Weighted,
            floor: Some(ScoreFloor {
                default: 2.0,
                relaxed: 2.0,
            }),
            question_fallback: None,
        }
    }

    pub fn expanded() -> Self {
        Self {
            name: "expanded".to_string(),
            exclude: words(HARD_EXCLUDE),
            exclude_override: ExcludeOverride::Keywords {
                keywords: words(BROAD_IDEA),
                min_hits: 2,
            },
            min_body_chars: 150,
            min_text_chars: Some(80),
            rules: introspective_rules(CategoryRule::new(IDEA, BROAD_IDEA).relaxes_floor()),
            mode: ScoreMode::Weighted,
            floor: Some(ScoreFloor {
                default: 2.0,
                relaxed: 1.5,
            }),
            question_fallback: None,
        }
    }

    pub fn lenient() -> Self {
        let mut positive = words(LENIENT_IDEA);
        positive.extend(words(LENIENT_PHILOSOPHY));
        positive.extend(words(LENIENT_CONCERN));

        Self {
            name: "lenient".to_string(),
            exclude: words(LENIENT_EXCLUDE),
            exclude_override: ExcludeOverride::Keywords {
                keywords: positive,
                min_hits: 1,
            },
            min_body_chars: 50,
            min_text_chars: None,
            rules: vec![
                CategoryRule::new(IDEA, LENIENT_IDEA),
                CategoryRule::new(PHILOSOPHY, LENIENT_PHILOSOPHY).min_chars(101),
                CategoryRule::new(CONCERN, LENIENT_CONCERN),
                CategoryRule::new(LEARNING, LENIENT_LEARNING),
            ],
            mode: ScoreMode::Membership,
            floor: None,
            question_fallback: Some(PHILOSOPHY.to_string()),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "strict" => Some(Self::strict()),
            "expanded" => Some(Self::expanded()),
            "lenient" => Some(Self::lenient()),
            _ => None,
        }
    }

    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.rules.iter().map(|rule| rule.label.clone()).collect();
        if let Some(fallback) = &self.question_fallback {
            if !labels.contains(fallback) {
                labels.push(fallback.clone());
            }
        }
        labels
    }
}

fn introspective_rules(idea: CategoryRule) -> Vec<CategoryRule> {
    vec![
        idea.weight(2.0),
        CategoryRule::new(PHILOSOPHY, DEEP_THOUGHT)
            .min_hits(2)
            .min_chars(300),
        CategoryRule::new(CONCERN, CONCERN_WORDS)
            .min_chars(250)
            .weight(1.5),
        CategoryRule::new(LEARNING, INSIGHT_WORDS)
            .min_chars(250)
            .weight(1.5)
            .requires_any(TECH_WORDS),
    ]
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryScore {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Assessment {
    // Highest score first; equal scores keep rule order.
    pub categories: Vec<CategoryScore>,
    pub score: f64,
    pub length: usize,
}

impl Assessment {
    pub fn labels(&self) -> Vec<&str> {
        self.categories
            .iter()
            .map(|category| category.label.as_str())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    policy: ClassifierPolicy,
    markup: Regex,
}

impl KeywordClassifier {
    pub fn new(policy: ClassifierPolicy) -> Result<Self, regex::Error> {
        Ok(Self {
            policy,
            markup: Regex::new(MARKUP_PATTERN)?,
        })
    }

    pub fn policy(&self) -> &ClassifierPolicy {
        &self.policy
    }

    pub fn classify(&self, label: &str, body: &str) -> Option<Assessment> {
        let policy = &self.policy;
        let haystack = format!("{label}\n{body}").to_lowercase();

        if contains_any(&haystack, &policy.exclude) && !self.exclusion_overridden(&haystack) {
            return None;
        }

        if body.trim().chars().count() < policy.min_body_chars {
            return None;
        }

        if let Some(min_text_chars) = policy.min_text_chars {
            let stripped = self.markup.replace_all(body, "");
            if stripped.trim().chars().count() < min_text_chars {
                return None;
            }
        }

        let length = body.chars().count();
        let mut categories = Vec::new();
        let mut relaxed = false;

        for rule in &policy.rules {
            let hits = count_hits(&haystack, &rule.keywords);
            if hits < rule.min_hits.max(1) || length < rule.min_chars {
                continue;
            }
            if !rule.requires_any.is_empty() && !contains_any(&haystack, &rule.requires_any) {
                continue;
            }

            let score = match policy.mode {
                ScoreMode::Weighted => hits as f64 * rule.weight,
                ScoreMode::Membership => 1.0,
            };
            relaxed |= rule.relaxes_floor;
            categories.push(CategoryScore {
                label: rule.label.clone(),
                score,
            });
        }

        if categories.is_empty() {
            if let Some(fallback) = &policy.question_fallback {
                if haystack.contains('?') || haystack.contains('？') {
                    categories.push(CategoryScore {
                        label: fallback.clone(),
                        score: match policy.mode {
                            ScoreMode::Weighted => 0.0,
                            ScoreMode::Membership => 1.0,
                        },
                    });
                }
            }
        }

        if categories.is_empty() {
            return None;
        }

        let score: f64 = categories.iter().map(|category| category.score).sum();
        if let Some(floor) = policy.floor {
            let minimum = if relaxed { floor.relaxed } else { floor.default };
            if score < minimum {
                return None;
            }
        }

        categories.sort_by(|left, right| right.score.total_cmp(&left.score));

        Some(Assessment {
            categories,
            score,
            length,
        })
    }

    fn exclusion_overridden(&self, haystack: &str) -> bool {
        match &self.policy.exclude_override {
            ExcludeOverride::Never => false,
            ExcludeOverride::Keywords { keywords, min_hits } => {
                count_hits(haystack, keywords) >= *min_hits
            }
        }
    }
}

// Number of distinct keywords present in `haystack`.
fn count_hits(haystack: &str, keywords: &[String]) -> usize {
    keywords
        .iter()
        .filter(|keyword| haystack.contains(keyword.as_str()))
        .count()
}

fn contains_any(haystack: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|keyword| haystack.contains(keyword.as_str()))
}

pub fn parse_category_tag(content: &str) -> Option<String> {
    let first_line = content.split('\n').next()?;
    if !first_line.trim().starts_with(CATEGORY_TAG) {
        return None;
    }

    let label = first_line.replace(CATEGORY_TAG, "").trim().to_string();
    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutcome {
    AlreadyTagged,
    Tagged(String),
}

pub fn apply_category_tag(content: &str, label: &str) -> TagOutcome {
    if content.starts_with(CATEGORY_TAG) {
        TagOutcome::AlreadyTagged
    } else {
        TagOutcome::Tagged(format!("{CATEGORY_TAG} {label}\n\n{content}"))
    }
}

#[derive(Debug, Clone)]
pub struct FilenameRules {
    pub rules: Vec<(String, Vec<String>)>,
    pub fallback: String,
}

impl Default for FilenameRules {
    fn default() -> Self {
        let table: [(&str, &[&str]); 6] = [
            (
                "운동/피트니스",
                &["운동", "루틴", "상체", "하체", "가슴", "복근", "팔", "인바디"],
            ),
            (
                "창업/비즈니스",
                &["북적북적", "창업", "아이템", "인력", "알바", "어플"],
            ),
            ("엔터테인먼트", &["영화", "책", "러브로지", "모엣샹동"]),
            ("여행", &["여행", "챙겨야"]),
            (
                "의료/건강",
                &[
                    "병원", "응급실", "할머니", "간호사", "의사", "시술", "발작", "심실성", "빈맥",
                    "손승우",
                ],
            ),
            ("학습/자격증", &["자격증", "중개사"]),
        ];

        Self {
            rules: table
                .iter()
                .map(|(label, keywords)| (label.to_string(), words(keywords)))
                .collect(),
            fallback: "기타".to_string(),
        }
    }
}

impl FilenameRules {
    pub fn categorize(&self, file_name: &str) -> &str {
        let lowered = file_name.to_lowercase();
        self.rules
            .iter()
            .find(|(_, keywords)| contains_any(&lowered, keywords))
            .map(|(label, _)| label.as_str())
            .unwrap_or(self.fallback.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILLER: &str = "abcdefghij ";

    fn padded(prefix: &str, repeats: usize) -> String {
        format!("{prefix}{}", FILLER.repeat(repeats))
    }

    fn classifier(policy: ClassifierPolicy) -> KeywordClassifier {
        KeywordClassifier::new(policy).unwrap()
    }

    #[test]
    fn strict_scores_and_orders_categories() {
        let body = padded("창업 인생 고민 선택 ", 30);
        let assessment = classifier(ClassifierPolicy::strict())
            .classify("note.md", &body)
            .expect("note should be kept");

        assert_eq!(assessment.labels(), vec![PHILOSOPHY, CONCERN, IDEA]);
        assert_eq!(assessment.categories[0].score, 3.0);
        assert_eq!(assessment.categories[1].score, 3.0);
        assert_eq!(assessment.categories[2].score, 2.0);
        assert_eq!(assessment.score, 8.0);
    }

    #[test]
    fn strict_rejects_short_notes() {
        let body = padded("창업 인생 고민 선택 ", 5);
        assert!(classifier(ClassifierPolicy::strict())
            .classify("note.md", &body)
            .is_none());
    }

    #[test]
    fn strict_rejects_markup_only_notes() {
        let body = format!("창업 고민 {}", "<div><br></div>".repeat(30));
        assert!(classifier(ClassifierPolicy::strict())
            .classify("note.md", &body)
            .is_none());
    }

    #[test]
    fn strict_applies_score_floor() {
        // One concern keyword: 1.5 < 2.0.
        let body = padded("걱정 ", 30);
        assert!(classifier(ClassifierPolicy::strict())
            .classify("note.md", &body)
            .is_none());
    }

    #[test]
    fn learning_requires_a_technical_context() {
        let policy = ClassifierPolicy::strict();
        let without_tech = padded("경험 이해 ", 30);
        assert!(classifier(policy.clone())
            .classify("note.md", &without_tech)
            .is_none());

        let with_tech = padded("경험 이해 react ", 30);
        let assessment = classifier(policy)
            .classify("note.md", &with_tech)
            .expect("learning note should be kept");
        assert_eq!(assessment.labels(), vec![LEARNING]);
        assert_eq!(assessment.score, 3.0);
    }

    #[test]
    fn exclusion_is_overridden_only_by_enough_idea_keywords() {
        let two_ideas = padded("쇼핑 창업 플랫폼 ", 20);
        let expanded = classifier(ClassifierPolicy::expanded())
            .classify("note.md", &two_ideas)
            .expect("expanded keeps notes with two idea keywords");
        assert_eq!(expanded.labels(), vec![IDEA]);
        assert_eq!(expanded.score, 4.0);

        let one_idea = padded("쇼핑 창업 ", 30);
        assert!(classifier(ClassifierPolicy::strict())
            .classify("note.md", &one_idea)
            .is_none());
        assert!(classifier(ClassifierPolicy::expanded())
            .classify("note.md", &one_idea)
            .is_none());
    }

    #[test]
    fn expanded_relaxes_the_floor_for_ideas() {
        let mut policy = ClassifierPolicy::expanded();
        policy.rules[0].weight = 1.6;
        let body = padded("앱 ", 20);

        let assessment = classifier(policy)
            .classify("note.md", &body)
            .expect("idea floor is 1.5");
        assert_eq!(assessment.labels(), vec![IDEA]);
    }

    #[test]
    fn file_name_takes_part_in_matching() {
        let body = padded("", 20);
        let assessment = classifier(ClassifierPolicy::expanded())
            .classify("스타트업 아이디어.md", &body)
            .expect("file name supplies idea keywords");
        assert_eq!(assessment.labels(), vec![IDEA]);
    }

    #[test]
    fn lenient_falls_back_to_reflection_on_questions() {
        let body = padded("오늘 무슨 일이 있었지? ", 5);
        let assessment = classifier(ClassifierPolicy::lenient())
            .classify("memo.md", &body)
            .expect("question should be kept");
        assert_eq!(assessment.labels(), vec![PHILOSOPHY]);
    }

    #[test]
    fn lenient_excludes_only_without_positive_signal() {
        let lenient = classifier(ClassifierPolicy::lenient());
        assert!(lenient
            .classify("memo.md", &padded("쇼핑 ", 6))
            .is_none());

        let kept = lenient
            .classify("memo.md", &padded("쇼핑 고민 ", 6))
            .expect("concern keyword rescues the note");
        assert_eq!(kept.labels(), vec![CONCERN]);
    }

    #[test]
    fn lenient_keeps_discovery_order() {
        let body = padded("창업 고민 공부 ", 10);
        let assessment = classifier(ClassifierPolicy::lenient())
            .classify("memo.md", &body)
            .expect("note should be kept");
        assert_eq!(assessment.labels(), vec![IDEA, CONCERN, LEARNING]);
        assert_eq!(assessment.score, 3.0);
    }

    #[test]
    fn policies_resolve_by_name() {
        assert_eq!(
            ClassifierPolicy::from_name("expanded").map(|policy| policy.name),
            Some("expanded".to_string())
        );
        assert!(ClassifierPolicy::from_name("fuzzy").is_none());
    }

    #[test]
    fn category_header_is_read_from_first_line() {
        assert_eq!(
            parse_category_tag("Category: 여행\n\n짐 목록").as_deref(),
            Some("여행")
        );
        assert_eq!(parse_category_tag("Category:   \nbody"), None);
        assert_eq!(parse_category_tag("body\nCategory: 여행"), None);
    }

    #[test]
    fn tagging_is_idempotent() {
        let first = apply_category_tag("body", "여행");
        let TagOutcome::Tagged(tagged) = first else {
            panic!("expected a new tag");
        };
        assert_eq!(tagged, "Category: 여행\n\nbody");
        assert_eq!(apply_category_tag(&tagged, "기타"), TagOutcome::AlreadyTagged);
        assert_eq!(parse_category_tag(&tagged).as_deref(), Some("여행"));
    }

    #[test]
    fn file_name_rules_pick_first_match() {
        let rules = FilenameRules::default();
        assert_eq!(rules.categorize("상체 운동 루틴.md"), "운동/피트니스");
        assert_eq!(rules.categorize("창업 운동.md"), "운동/피트니스");
        assert_eq!(rules.categorize("여행 준비.md"), "여행");
        assert_eq!(rules.categorize("random.md"), "기타");
    }
}
