// Catalog sites

mod zoro;

pub use zoro::Zoro;
