pub mod supabase;

pub use supabase::{IndexStatus, SchemaCheck, SupabaseStore};
