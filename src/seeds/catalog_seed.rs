use mongodb::bson::{doc, oid::ObjectId};

use crate::database::MongoDB;
use crate::models::{
    now_millis, Accessibility, BoardCategory, Comment, CommodityCategory, Discussion, Fees,
    MarketData, News, OpeningHours, PriceRange, Prices, Quality, Rating, Reply, Service,
    ServiceCategory, ServiceContact, Trend,
};

use super::admin_seed::seed_admin;

const HOUR_MS: i64 = 60 * 60 * 1000;

/// Static description of one catalog service.
struct ServiceSeed {
    name: &'static str,
    description: &'static str,
    category: ServiceCategory,
    department: &'static str,
    website: &'static str,
    helpline: &'static str,
    email: &'static str,
    eligibility: &'static [&'static str],
    documents: &'static [&'static str],
    processing_time: &'static str,
    fee: f64,
    languages: &'static [&'static str],
    tags: &'static [&'static str],
}

const REGIONAL: &[&str] = &["Hindi", "English", "Regional Languages"];
const BILINGUAL: &[&str] = &["Hindi", "English"];

const SERVICE_SEEDS: [ServiceSeed; 8] = [
    ServiceSeed {
        name: "Aadhaar Card Services",
        description: "Aadhaar is a 12-digit unique identity number that can be obtained by residents of India, based on their biometric and demographic data. It serves as a proof of identity and address, anywhere in India.",
        category: ServiceCategory::IdentityDocuments,
        department: "Unique Identification Authority of India (UIDAI)",
        website: "https://uidai.gov.in",
        helpline: "1947",
        email: "help@uidai.gov.in",
        eligibility: &["Indian resident", "Any age"],
        documents: &["Proof of Identity", "Proof of Address", "Proof of Date of Birth"],
        processing_time: "90 days",
        fee: 0.0,
        languages: REGIONAL,
        tags: &["identity", "biometric", "unique-id", "uidai", "resident"],
    },
    ServiceSeed {
        name: "PAN Card Services",
        description: "Permanent Account Number (PAN) is a ten-character alphanumeric identifier issued by the Income Tax Department. It is mandatory for financial transactions and tax filing in India.",
        category: ServiceCategory::FinancialServices,
        department: "Income Tax Department",
        website: "https://www.incometax.gov.in",
        helpline: "020-27218080",
        email: "tinpancard@nsdl.co.in",
        eligibility: &["Indian citizen or foreign national", "Engaged in financial transactions"],
        documents: &["Identity Proof", "Address Proof", "Date of Birth Proof"],
        processing_time: "15-20 days",
        fee: 110.0,
        languages: BILINGUAL,
        tags: &["pan", "tax", "income-tax", "financial", "nsdl"],
    },
    ServiceSeed {
        name: "Passport Services",
        description: "Indian Passport is issued by the Ministry of External Affairs for international travel. Apply for new passport, renewal, or other passport-related services online.",
        category: ServiceCategory::IdentityDocuments,
        department: "Passport Seva, Ministry of External Affairs",
        website: "https://www.passportindia.gov.in",
        helpline: "1800-258-1800",
        email: "support@passportindia.gov.in",
        eligibility: &["Indian citizen", "Valid documents"],
        documents: &["Birth Certificate", "Address Proof", "Identity Proof"],
        processing_time: "30 days",
        fee: 1500.0,
        languages: BILINGUAL,
        tags: &["passport", "travel", "mea", "international", "visa"],
    },
    ServiceSeed {
        name: "DigiLocker Services",
        description: "DigiLocker is a digital locker system offered by the Government of India to Indian citizens to store their important documents like driving license, vehicle registration, etc. in digital format.",
        category: ServiceCategory::DigitalServices,
        department: "Ministry of Electronics and Information Technology",
        website: "https://digilocker.gov.in",
        helpline: "011-24301818",
        email: "support@digitallocker.gov.in",
        eligibility: &["Indian citizen with Aadhaar", "Mobile number"],
        documents: &["Aadhaar Number", "Mobile Number"],
        processing_time: "Instant",
        fee: 0.0,
        languages: REGIONAL,
        tags: &["digilocker", "documents", "digital", "cloud", "storage"],
    },
    ServiceSeed {
        name: "EPFO Services",
        description: "Employees Provident Fund Organisation provides retirement benefits to organized sector workers. Manage your PF account, check balance, withdraw funds, and transfer PF online.",
        category: ServiceCategory::FinancialServices,
        department: "Employees Provident Fund Organisation",
        website: "https://www.epfindia.gov.in",
        helpline: "1800-118-005",
        email: "support@epfindia.gov.in",
        eligibility: &["Employee in organized sector", "UAN number"],
        documents: &["UAN", "Aadhaar", "Bank Details"],
        processing_time: "15-30 days",
        fee: 0.0,
        languages: BILINGUAL,
        tags: &["epfo", "pf", "provident-fund", "retirement", "uan"],
    },
    ServiceSeed {
        name: "PM-KISAN Scheme",
        description: "Pradhan Mantri Kisan Samman Nidhi provides income support of ₹6000 per year to small and marginal farmer families. Check eligibility, apply online, and track payment status.",
        category: ServiceCategory::SocialWelfare,
        department: "Department of Agriculture and Farmers Welfare",
        website: "https://pmkisan.gov.in",
        helpline: "155261",
        email: "pmkisan-ict@gov.in",
        eligibility: &["Small and marginal farmers", "Landholding up to 2 hectares"],
        documents: &["Land Records", "Aadhaar", "Bank Account"],
        processing_time: "30-45 days",
        fee: 0.0,
        languages: REGIONAL,
        tags: &["pm-kisan", "farmer", "agriculture", "income-support", "subsidy"],
    },
    ServiceSeed {
        name: "Ayushman Bharat - PMJAY",
        description: "Pradhan Mantri Jan Arogya Yojana provides health insurance coverage of up to ₹5 lakh per family per year for secondary and tertiary care hospitalization.",
        category: ServiceCategory::Healthcare,
        department: "National Health Authority",
        website: "https://pmjay.gov.in",
        helpline: "14555",
        email: "support@pmjay.gov.in",
        eligibility: &["SECC 2011 beneficiaries", "Eligible as per deprivation criteria"],
        documents: &["Ration Card", "Aadhaar", "Family ID"],
        processing_time: "Instant verification",
        fee: 0.0,
        languages: REGIONAL,
        tags: &["ayushman-bharat", "pmjay", "health-insurance", "healthcare", "nha"],
    },
    ServiceSeed {
        name: "RTI Online Services",
        description: "Right to Information Act empowers citizens to seek information from public authorities. File RTI applications online, track status, and receive responses digitally.",
        category: ServiceCategory::Legal,
        department: "Central Information Commission",
        website: "https://rtionline.gov.in",
        helpline: "1800-11-1204",
        email: "cic@nic.in",
        eligibility: &["Indian citizen", "Seeking government information"],
        documents: &["Identity Proof"],
        processing_time: "30 days",
        fee: 10.0,
        languages: BILINGUAL,
        tags: &["rti", "information", "transparency", "cic", "government"],
    },
];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn office_hours() -> OpeningHours {
    let weekday = || Some("10:00 AM - 5:00 PM".to_string());
    OpeningHours {
        monday: weekday(),
        tuesday: weekday(),
        wednesday: weekday(),
        thursday: weekday(),
        friday: weekday(),
        saturday: Some("10:00 AM - 2:00 PM".to_string()),
        sunday: Some("Closed".to_string()),
    }
}

impl ServiceSeed {
    fn to_service(&self, now: i64) -> Service {
        Service {
            id: None,
            name: self.name.to_string(),
            description: self.description.to_string(),
            category: self.category,
            department: self.department.to_string(),
            contact: ServiceContact {
                phone: Some(self.helpline.to_string()),
                email: Some(self.email.to_string()),
                website: Some(self.website.to_string()),
                address: None,
            },
            hours: office_hours(),
            eligibility: strings(self.eligibility),
            requirements: strings(self.documents),
            languages: strings(self.languages),
            accessibility: Accessibility {
                wheelchair_accessible: true,
                sign_language: false,
                braille: false,
            },
            rating: Rating::default(),
            tags: strings(self.tags),
            fees: Some(Fees { normal: self.fee, currency: "INR".to_string() }),
            processing_time: Some(self.processing_time.to_string()),
            official_website: Some(self.website.to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

pub fn catalog_services(now: i64) -> Vec<Service> {
    let mut services: Vec<Service> = SERVICE_SEEDS.iter().map(|s| s.to_service(now)).collect();
    // Aadhaar centres are the only listing with full accessibility support.
    if let Some(aadhaar) = services.first_mut() {
        aadhaar.accessibility = Accessibility {
            wheelchair_accessible: true,
            sign_language: true,
            braille: true,
        };
    }
    services
}

fn range(min: f64, max: f64, average: f64) -> PriceRange {
    PriceRange { min, max, average }
}

#[allow(clippy::too_many_arguments)]
fn market_record(
    commodity: &str,
    category: CommodityCategory,
    (state, district, market): (&str, &str, &str),
    wholesale: PriceRange,
    retail: PriceRange,
    unit: &str,
    quality: Quality,
    (trend, change_percent): (Trend, Option<f64>),
    now: i64,
) -> MarketData {
    MarketData {
        id: None,
        commodity: commodity.to_string(),
        category,
        state: state.to_string(),
        district: Some(district.to_string()),
        market: Some(market.to_string()),
        prices: Prices { wholesale, retail },
        unit: unit.to_string(),
        quality,
        trend,
        change_percent,
        last_updated: now,
        source: "Government Market Committee".to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn catalog_market_data(now: i64) -> Vec<MarketData> {
    vec![
        market_record(
            "Onion", CommodityCategory::Vegetables, ("Maharashtra", "Nashik", "Lasalgaon"),
            range(800.0, 1200.0, 1000.0), range(1200.0, 1600.0, 1400.0),
            "per quintal", Quality::Good, (Trend::Stable, None), now,
        ),
        market_record(
            "Tomato", CommodityCategory::Vegetables, ("Karnataka", "Bangalore", "Yeshwantpur"),
            range(15.0, 25.0, 20.0), range(25.0, 35.0, 30.0),
            "per kg", Quality::Premium, (Trend::Rising, Some(5.2)), now,
        ),
        market_record(
            "Rice", CommodityCategory::Grains, ("Punjab", "Amritsar", "Amritsar Grain Market"),
            range(2800.0, 3200.0, 3000.0), range(35.0, 45.0, 40.0),
            "per quintal", Quality::Premium, (Trend::Stable, None), now,
        ),
        market_record(
            "Wheat", CommodityCategory::Grains, ("Uttar Pradesh", "Meerut", "Meerut Grain Market"),
            range(2200.0, 2600.0, 2400.0), range(28.0, 32.0, 30.0),
            "per quintal", Quality::Good, (Trend::Falling, Some(-2.1)), now,
        ),
        market_record(
            "Apple", CommodityCategory::Fruits, ("Himachal Pradesh", "Shimla", "Shimla Fruit Market"),
            range(80.0, 120.0, 100.0), range(120.0, 180.0, 150.0),
            "per kg", Quality::Premium, (Trend::Stable, None), now,
        ),
    ]
}

fn comment(author: &str, content: &str, upvotes: i64, now: i64) -> Comment {
    Comment {
        id: Some(ObjectId::new()),
        author: author.to_string(),
        content: content.to_string(),
        created_at: now,
        upvotes,
    }
}

#[allow(clippy::too_many_arguments)]
fn news_item(
    title: &str,
    excerpt: &str,
    content: &str,
    author: &str,
    category: BoardCategory,
    tags: &[&str],
    upvotes: i64,
    comments: Vec<Comment>,
    is_featured: bool,
    now: i64,
) -> News {
    News {
        id: None,
        title: title.to_string(),
        excerpt: excerpt.to_string(),
        content: content.to_string(),
        author: author.to_string(),
        category,
        tags: strings(tags),
        upvotes,
        downvotes: 0,
        comments,
        is_active: true,
        is_featured,
        source: crate::models::default_source(),
        external_url: None,
        image_url: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_news(now: i64) -> Vec<News> {
    vec![
        news_item(
            "New Digital India Initiative Launched",
            "Government announces comprehensive digital transformation program for all government services",
            "The Government of India has launched a new comprehensive digital transformation initiative aimed at making all government services available online. This initiative will streamline processes and improve citizen experience across all departments.",
            "Digital India Team",
            BoardCategory::Service,
            &["digital-india", "government", "services"],
            45,
            vec![
                comment("citizen_user", "This is a great step forward for digital governance!", 12, now),
                comment("tech_enthusiast", "Looking forward to seeing how this improves service delivery.", 8, now),
            ],
            true,
            now,
        ),
        news_item(
            "Aadhaar Services Now Available 24/7",
            "UIDAI extends service hours for better citizen convenience and faster processing",
            "The Unique Identification Authority of India (UIDAI) has announced that Aadhaar services will now be available 24/7 through online portals and select centers. This move aims to reduce waiting times and improve accessibility for citizens across the country.",
            "UIDAI",
            BoardCategory::Service,
            &["aadhaar", "uidai", "24x7"],
            32,
            vec![comment("working_professional", "Finally! No more taking leave to get Aadhaar services.", 15, now)],
            false,
            now,
        ),
        news_item(
            "Stock Market Hits New High",
            "NIFTY 50 crosses 20,000 mark for the first time in history",
            "The Indian stock market reached a historic milestone today as the NIFTY 50 index crossed the 20,000 mark for the first time. This surge is attributed to strong corporate earnings and positive economic indicators.",
            "Market Reporter",
            BoardCategory::Market,
            &["nifty", "stock-market", "milestone"],
            78,
            vec![
                comment("investor_pro", "Great time for long-term investors!", 23, now),
                comment("market_analyst", "Need to be cautious about market corrections.", 18, now),
            ],
            true,
            now,
        ),
        news_item(
            "IT Sector Shows Strong Growth",
            "Technology stocks lead the market rally with impressive quarterly results",
            "The Information Technology sector continues to show robust growth with major companies reporting strong quarterly results. Companies like TCS, Infosys, and Wipro have exceeded market expectations.",
            "Financial Times India",
            BoardCategory::Market,
            &["it-sector", "growth", "quarterly-results"],
            56,
            vec![],
            false,
            now,
        ),
        news_item(
            "Onion Prices Stabilize Across India",
            "Government intervention helps control vegetable prices in major markets",
            "After weeks of price volatility, onion prices have stabilized across major markets in India. The government's intervention through buffer stock release and import measures has helped bring prices under control.",
            "Agriculture Ministry",
            BoardCategory::Commodity,
            &["onion", "prices", "agriculture"],
            34,
            vec![comment("farmer_voice", "Good news for both farmers and consumers.", 9, now)],
            false,
            now,
        ),
        news_item(
            "AI Revolution in Government Services",
            "How artificial intelligence is transforming public service delivery in India",
            "Artificial Intelligence is revolutionizing the way government services are delivered to citizens. From chatbots to automated processing systems, AI is making services faster, more efficient, and accessible 24/7.",
            "Tech Insider",
            BoardCategory::Ai,
            &["ai", "government", "technology"],
            67,
            vec![comment("ai_researcher", "The potential for AI in governance is immense.", 18, now)],
            false,
            now,
        ),
        news_item(
            "System Maintenance Scheduled",
            "Planned maintenance window this weekend for system upgrades",
            "We have scheduled system maintenance this weekend from 2 AM to 6 AM IST on Sunday. During this time, some services may be temporarily unavailable. We apologize for any inconvenience.",
            "System Admin",
            BoardCategory::Admin,
            &["maintenance", "system", "upgrade"],
            12,
            vec![comment("regular_user", "Thanks for the advance notice!", 3, now)],
            false,
            now,
        ),
    ]
}

/// Reply posted `hours_ago` hours before `now` by a placeholder account.
fn reply(author_name: &str, content: &str, upvotes: i64, hours_ago: i64, now: i64) -> Reply {
    Reply {
        id: Some(ObjectId::new()),
        author: Some(ObjectId::new().to_hex()),
        author_name: author_name.to_string(),
        content: content.to_string(),
        created_at: now - hours_ago * HOUR_MS,
        upvotes,
        downvotes: 0,
    }
}

#[allow(clippy::too_many_arguments)]
fn thread(
    title: &str,
    content: &str,
    author_name: &str,
    category: BoardCategory,
    tags: &[&str],
    (upvotes, views): (i64, i64),
    replies: Vec<Reply>,
    is_pinned: bool,
    now: i64,
) -> Discussion {
    let last_activity = replies.iter().map(|r| r.created_at).max().unwrap_or(now);
    Discussion {
        id: None,
        title: title.to_string(),
        content: content.to_string(),
        author: ObjectId::new().to_hex(),
        author_name: author_name.to_string(),
        category,
        tags: strings(tags),
        upvotes,
        downvotes: 0,
        replies,
        is_active: true,
        is_pinned,
        is_locked: false,
        views,
        last_activity,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_discussions(now: i64) -> Vec<Discussion> {
    vec![
        thread(
            "How to speed up passport application process?",
            "I've been waiting for my passport application to be processed for over a month. Are there any ways to expedite the process? Has anyone had success with the Tatkal service?",
            "citizen_user",
            BoardCategory::Service,
            &["passport", "application", "tatkal"],
            (15, 45),
            vec![
                reply("helpful_citizen", "Try the Tatkal service if you need it urgently. It costs more but processes faster.", 8, 2, now),
                reply("passport_expert", "Make sure all your documents are in order. Any missing document can delay the process significantly.", 12, 1, now),
            ],
            false,
            now,
        ),
        thread(
            "Best stocks to invest in 2024?",
            "Looking for advice on good stocks for long-term investment in 2024. Considering IT sector and banking. What are your thoughts?",
            "investor_pro",
            BoardCategory::Market,
            &["investment", "stocks", "2024"],
            (28, 89),
            vec![
                reply("market_guru", "IT sector looks promising with digital transformation trends. Consider TCS and Infosys.", 15, 3, now),
                reply("banking_analyst", "Banking sector is also good. HDFC Bank and ICICI Bank are solid choices.", 12, 2, now),
                reply("risk_manager", "Don't forget to diversify your portfolio. Never put all eggs in one basket.", 20, 1, now),
            ],
            true,
            now,
        ),
        thread(
            "Issues with Aadhaar update service",
            "Has anyone faced issues with the online Aadhaar update service? My address update request has been pending for weeks.",
            "concerned_citizen",
            BoardCategory::Service,
            &["aadhaar", "update", "issues"],
            (8, 23),
            vec![reply("aadhaar_helper", "Try visiting the nearest Aadhaar center. Sometimes online updates take longer.", 5, 4, now)],
            false,
            now,
        ),
        thread(
            "Commodity trading tips for beginners",
            "New to commodity trading. Looking for basic tips and strategies. What should I know before starting?",
            "trading_newbie",
            BoardCategory::Commodity,
            &["commodity", "trading", "beginner"],
            (18, 67),
            vec![
                reply("commodity_trader", "Start with understanding the basics of supply and demand. Weather and government policies heavily impact commodity prices.", 10, 5, now),
                reply("risk_advisor", "Never invest more than you can afford to lose. Commodity markets can be very volatile.", 14, 3, now),
            ],
            false,
            now,
        ),
    ]
}

/// Upserts the admin, replaces the service catalog and market data,
/// then fills the boards when they are empty.
pub async fn seed_catalog(db: &MongoDB) -> Result<(), String> {
    seed_admin(db).await?;

    let now = now_millis();
    let services = db.collection::<Service>(Service::COLLECTION);
    let market = db.collection::<MarketData>(MarketData::COLLECTION);

    services
        .delete_many(doc! {})
        .await
        .map_err(|e| format!("Failed to clear services: {}", e))?;
    market
        .delete_many(doc! {})
        .await
        .map_err(|e| format!("Failed to clear market data: {}", e))?;
    log::info!("🧹 Cleared existing services and market data");

    let inserted = services
        .insert_many(catalog_services(now))
        .await
        .map_err(|e| format!("Failed to insert services: {}", e))?;
    log::info!("   ✅ Inserted {} government services", inserted.inserted_ids.len());

    let inserted = market
        .insert_many(catalog_market_data(now))
        .await
        .map_err(|e| format!("Failed to insert market data: {}", e))?;
    log::info!("   ✅ Inserted {} market records", inserted.inserted_ids.len());

    seed_boards(db, now).await?;

    log::info!("🌱 Database seeded with government services and market data");
    Ok(())
}

async fn seed_boards(db: &MongoDB, now: i64) -> Result<(), String> {
    let news = db.collection::<News>(News::COLLECTION);
    let news_count = news
        .count_documents(doc! {})
        .await
        .map_err(|e| format!("Failed to count news: {}", e))?;
    if news_count == 0 {
        let inserted = news
            .insert_many(sample_news(now))
            .await
            .map_err(|e| format!("Failed to insert news: {}", e))?;
        log::info!("   ✅ Inserted {} news items", inserted.inserted_ids.len());
    } else {
        log::info!("📰 News: {} items already in DB, skipping", news_count);
    }

    let discussions = db.collection::<Discussion>(Discussion::COLLECTION);
    let thread_count = discussions
        .count_documents(doc! {})
        .await
        .map_err(|e| format!("Failed to count discussions: {}", e))?;
    if thread_count == 0 {
        let inserted = discussions
            .insert_many(sample_discussions(now))
            .await
            .map_err(|e| format!("Failed to insert discussions: {}", e))?;
        log::info!("   ✅ Inserted {} discussions", inserted.inserted_ids.len());
    } else {
        log::info!("💬 Discussions: {} threads already in DB, skipping", thread_count);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_db;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_has_eight_distinct_services() {
        let services = catalog_services(0);
        assert_eq!(services.len(), 8);
        let names: HashSet<_> = services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), 8);

        let rti = services.iter().find(|s| s.name.starts_with("RTI")).unwrap();
        assert_eq!(rti.category, ServiceCategory::Legal);
        assert_eq!(rti.fees.as_ref().unwrap().normal, 10.0);
        assert_eq!(rti.contact.phone.as_deref(), Some("1800-11-1204"));
        assert!(services[0].accessibility.braille);
        assert!(!services[1].accessibility.braille);
    }

    #[test]
    fn test_market_records_carry_trend_and_change() {
        let records = catalog_market_data(0);
        assert_eq!(records.len(), 5);
        let wheat = records.iter().find(|r| r.commodity == "Wheat").unwrap();
        assert_eq!(wheat.trend, Trend::Falling);
        assert_eq!(wheat.change_percent, Some(-2.1));
        assert_eq!(wheat.prices.wholesale.average, 2400.0);
        assert!(records.iter().filter(|r| r.commodity != "Tomato" && r.commodity != "Wheat").all(|r| r.change_percent.is_none()));
    }

    #[test]
    fn test_discussion_last_activity_is_latest_reply() {
        let now = 10 * HOUR_MS;
        let threads = sample_discussions(now);
        assert_eq!(threads.len(), 4);
        assert_eq!(threads[0].last_activity, now - HOUR_MS);
        assert_eq!(threads[2].last_activity, now - 4 * HOUR_MS);
        assert!(threads[1].is_pinned);
    }

    #[test]
    fn test_featured_news() {
        let news = sample_news(0);
        assert_eq!(news.len(), 7);
        assert_eq!(news.iter().filter(|n| n.is_featured).count(), 2);
        assert!(news.iter().flat_map(|n| &n.comments).all(|c| c.id.is_some()));
    }

    #[actix_web::test]
    #[ignore = "requires a running MongoDB"]
    async fn test_reseeding_replaces_catalog() {
        let db = test_db().await;
        seed_catalog(&db).await.unwrap();
        seed_catalog(&db).await.unwrap();

        let services = db.collection::<Service>(Service::COLLECTION);
        assert_eq!(services.count_documents(doc! {}).await.unwrap(), 8);
        let market = db.collection::<MarketData>(MarketData::COLLECTION);
        assert_eq!(market.count_documents(doc! {}).await.unwrap(), 5);
    }
}
