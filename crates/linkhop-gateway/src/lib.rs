//! HTTP surface of linkhop.
//!
//! | method   | path            | purpose                          |
//! |----------|-----------------|----------------------------------|
//! | `GET`    | `/{code}`       | 301 redirect to the target       |
//! | `POST`   | `/links`        | register a link                  |
//! | `GET`    | `/links/{code}` | stored record, even if inactive  |
//! | `PATCH`  | `/links/{code}` | replace the expiry               |
//! | `DELETE` | `/links/{code}` | soft delete                      |
//! | `GET`    | `/health`       | liveness                         |
//! | `GET`    | `/health/deep`  | store and shared cache reachable |
//! | `GET`    | `/debug/cache`  | local cache counters             |

pub mod app;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod headers;
pub mod model;
pub mod state;

pub use app::App;
pub use state::AppState;
