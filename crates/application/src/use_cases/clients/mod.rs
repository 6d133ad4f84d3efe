pub mod resolve_client_name;

pub use resolve_client_name::ResolveClientNameUseCase;
