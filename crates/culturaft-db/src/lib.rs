//! # culturaft-db: Database Layer for Culturaft
//!
//! SQLite storage for the catalog, orders and the admin notification feed,
//! using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Culturaft Data Flow                              │
//! │                                                                         │
//! │  POST /api/orders                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   culturaft-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo    │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ OrderRepo      │   │ 001_init.sql │  │   │
//! │  │   │               │    │ NotificationRe │   │              │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │                     ./culturaft.db                              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pricing, status rules and validation live in `culturaft-core`; this crate
//! only persists their results and enforces what needs the database (stock
//! reservation, status compare-and-set).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use culturaft_db::{Database, DbConfig, ProductFilter};
//!
//! let db = Database::new(DbConfig::new("./culturaft.db")).await?;
//!
//! let featured = db
//!     .products()
//!     .list(&ProductFilter { category: None, featured: Some(true) })
//!     .await?;
//! let order = db.orders().place_order(&new_order).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::notification::NotificationRepository;
pub use repository::order::{NewOrder, OrderRepository, StatusUpdate};
pub use repository::product::{ProductFilter, ProductRepository};
