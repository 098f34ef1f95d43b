// Route handlers grouped by resource:
// movies  - movie documents and their credits (public)
// users   - signin (public), account management (admin)
// system  - service info and health
pub mod movies;
pub mod system;
pub mod users;
pub mod utils;
