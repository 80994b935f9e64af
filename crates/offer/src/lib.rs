//! `storefront-offer`: product ranges and their membership rules.

pub mod forms;
pub mod range;
pub mod range_book;

pub use forms::{
    RangeForm, RangeFormData, RangeProductForm, RangeProductFormData, RangeProductUpload, tokenise,
};
pub use range::Range;
pub use range_book::RangeBook;
