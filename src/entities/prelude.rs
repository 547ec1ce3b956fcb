pub use super::bookmarks::Entity as Bookmarks;
pub use super::sessions::Entity as Sessions;
pub use super::users::Entity as Users;
