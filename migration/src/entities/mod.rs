pub mod ad;
pub mod aggregated_analytics;
pub mod archived_click;
pub mod click;
pub mod monthly_analytics;

pub use ad::Entity as AdEntity;
pub use aggregated_analytics::Entity as AggregatedAnalyticsEntity;
pub use archived_click::Entity as ArchivedClickEntity;
pub use click::Entity as ClickEntity;
pub use monthly_analytics::Entity as MonthlyAnalyticsEntity;
