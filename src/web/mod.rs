pub mod capture;
pub mod landing;
pub mod pixel;
pub mod report;
pub mod routes;
pub mod server;
