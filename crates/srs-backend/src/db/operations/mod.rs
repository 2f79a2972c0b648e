pub mod events;
pub mod items;
pub mod priority_cache;
pub mod review_state;
