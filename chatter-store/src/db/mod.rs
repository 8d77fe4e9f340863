pub mod schema;
pub mod connection;
pub mod entity;
pub mod repository;
pub mod relations;
pub mod associations;
pub mod accessors;

pub use accessors::{
    CommentAssociations, LikeAssociations, PostAssociations, ProfileAssociations,
    UserAssociations,
};
pub use associations::{Associations, CollectionRelation};
pub use connection::{Database, DbConnection, DbPool, SyncOptions};
pub use entity::Entity;
pub use relations::{BelongsTo, BelongsToMany, Cardinality, HasMany, HasOne, Relation};
pub use repository::{
    CommentRepository, LikeRepository, PostRepository, ProfileRepository, Repository,
    UserRepository,
};
