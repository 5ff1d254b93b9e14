mod debug;
mod health;
mod links;
mod redirect;

pub use debug::cache_stats_handler;
pub use health::{deep_health_handler, health_handler};
pub use links::{
    create_link_handler, delete_link_handler, link_detail_handler, update_link_handler,
};
pub use redirect::redirect_handler;
