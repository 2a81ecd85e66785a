//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod answer_upvote;
pub mod cart_item;
pub mod community_post;
pub mod customer;
pub mod disease_report;
pub mod message;
pub mod notification;
pub mod order;
pub mod order_item;
pub mod post_answer;
pub mod post_follow;
pub mod post_upvote;
pub mod product;
pub mod sale;
pub mod sale_item;
pub mod user;
pub mod user_review;
pub mod weather_data;

// Re-export specific types to avoid conflicts
pub use answer_upvote::Entity as AnswerUpvote;
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use community_post::{Entity as CommunityPost, Model as CommunityPostModel, PostType};
pub use customer::{Entity as Customer, Model as CustomerModel};
pub use disease_report::{Entity as DiseaseReport, Model as DiseaseReportModel, ReportStatus};
pub use message::{Entity as Message, Model as MessageModel};
pub use notification::{Entity as Notification, Model as NotificationModel, NotificationType};
pub use order::{Entity as Order, Model as OrderModel, OrderStatus, PaymentMethod};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use post_answer::{Entity as PostAnswer, Model as PostAnswerModel};
pub use post_follow::Entity as PostFollow;
pub use post_upvote::Entity as PostUpvote;
pub use product::{Entity as Product, Model as ProductModel};
pub use sale::{Entity as Sale, Model as SaleModel};
pub use sale_item::{Entity as SaleItem, Model as SaleItemModel};
pub use user::{Entity as User, Model as UserModel, Role};
pub use user_review::{Entity as UserReview, Model as UserReviewModel};
pub use weather_data::{Entity as WeatherData, Model as WeatherDataModel};
