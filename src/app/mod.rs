pub mod favorites;
pub mod model;
pub mod routes;
