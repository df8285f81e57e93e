//! Public data types exposed by the core library.

mod post;
mod status;

pub use post::{GeoLocation, Post, PostId, ReplyTarget};
pub use status::{
    DeletionNotice, StatusAuthor, StatusEntities, StatusGeo, StatusPlace, StatusUpdate, UrlEntity,
    twitter_date,
};
