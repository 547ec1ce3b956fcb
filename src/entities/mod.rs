pub mod prelude;

pub mod bookmarks;
pub mod sessions;
pub mod users;
