pub mod diary;

pub use diary::DiaryService;
