use mongodb::{Client, Collection, Database};
use std::error::Error;

use crate::models::{ChatSession, Discussion, MarketData, News, Service, ServiceFeedback, User};

const DEFAULT_DB_NAME: &str = "civic-ai";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        // Fail fast when the server is down instead of hanging for 30s
        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let db_name = client_options
            .default_database
            .clone()
            .unwrap_or_else(|| DEFAULT_DB_NAME.to_string());

        let client = Client::with_options(client_options)?;
        let db = client.database(&db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };

        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes the query handlers rely on.
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        use mongodb::bson::{doc, Document};
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let indexes: Vec<(&str, Document, bool)> = vec![
            (User::COLLECTION, doc! { "email": 1 }, true),
            (ChatSession::COLLECTION, doc! { "sessionId": 1 }, true),
            (Service::COLLECTION, doc! { "name": "text", "description": "text", "tags": "text" }, false),
            (Service::COLLECTION, doc! { "category": 1, "isActive": 1 }, false),
            (News::COLLECTION, doc! { "category": 1, "createdAt": -1 }, false),
            (News::COLLECTION, doc! { "title": "text", "excerpt": "text", "content": "text" }, false),
            (Discussion::COLLECTION, doc! { "category": 1, "lastActivity": -1 }, false),
            (Discussion::COLLECTION, doc! { "isPinned": -1, "lastActivity": -1 }, false),
            (Discussion::COLLECTION, doc! { "title": "text", "content": "text" }, false),
            (MarketData::COLLECTION, doc! { "commodity": 1, "state": 1, "lastUpdated": -1 }, false),
            (MarketData::COLLECTION, doc! { "category": 1, "state": 1 }, false),
            (ServiceFeedback::COLLECTION, doc! { "serviceId": 1, "status": 1 }, false),
            (ServiceFeedback::COLLECTION, doc! { "userId": 1, "createdAt": -1 }, false),
        ];

        for (collection, keys, unique) in indexes {
            let description = format!("{}({})", collection, keys.keys().cloned().collect::<Vec<_>>().join(", "));

            let options = if unique {
                Some(IndexOptions::builder().unique(true).build())
            } else {
                None
            };
            let model = IndexModel::builder().keys(keys).options(options).build();

            match self
                .database()
                .collection::<Document>(collection)
                .create_index(model)
                .await
            {
                Ok(_) => log::info!("   ✅ Index created: {}", description),
                Err(e) => log::debug!("   ℹ️  Index already exists: {} ({})", description, e),
            }
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
