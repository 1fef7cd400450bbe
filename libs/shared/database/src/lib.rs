pub mod supabase;

pub use supabase::{rest_path, DbError, SupabaseClient};
