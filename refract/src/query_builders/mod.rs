pub mod count;
pub mod first;
pub mod many;
pub mod tuple;
pub mod unique;
pub(crate) mod utils;

pub use count::CountQueryBuilder;
pub use first::FirstQueryBuilder;
pub use many::ManyQueryBuilder;
pub use unique::UniqueQueryBuilder;
