pub mod hostname_resolver;

pub use hostname_resolver::ReverseResolver;
