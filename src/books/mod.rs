// Book catalogue
// Remote API client and the payloads exchanged with it

mod client;
mod types;

pub use client::BookApiClient;
pub use types::{
    AddBookForm, Book, BorrowForm, BorrowRecord, BorrowRequest, CreatedBook, NewBook, ReturnForm,
    ReturnRequest, BORROW_DAY_OPTIONS, DEFAULT_BORROW_DAYS,
};
