use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};
use serde::Serialize;

use crate::{
    database::MongoDB,
    models::{ChatMessage, MessageRole, Service},
    services::llm::{CompletionRequest, ProviderChain},
    utils::escape_regex,
};

pub const CIVIC_SYSTEM_PROMPT: &str = "You are an advanced AI assistant for Indian citizens seeking information about government services and public welfare schemes. You are the official digital assistant for the Government of India's civic services platform.

Your role and capabilities:
- Help citizens understand government services in multiple Indian languages
- Provide accurate, up-to-date information about eligibility, requirements, and procedures
- Be respectful and use appropriate Indian cultural context
- Handle queries in Hindi, English, and other regional languages
- Never provide medical diagnosis or legal advice - only guide to appropriate services
- Use simple, accessible language that rural and urban citizens can understand
- Include both Hindi and English terms when helpful

Guidelines for responses:
- Always be helpful, respectful, and culturally sensitive
- Provide practical, actionable information with specific steps
- Mention relevant government schemes and their benefits
- Include contact information and office hours when available
- If you don't know something specific, admit it and suggest contacting the relevant department
- Include disclaimers for health, legal, and financial matters
- Provide information in the user's preferred language when possible";

pub const CHAT_ERROR_MESSAGE: &str = "I apologize, but I'm having trouble right now. Please try again or contact the citizen helpline at 1950.\n\nक्षमा करें, मुझे कुछ समस्या हो रही है। कृपया दोबारा कोशिश करें।";

const MAX_RELEVANT_SERVICES: i64 = 5;
const MAX_SUGGESTIONS: usize = 4;
pub const HISTORY_WINDOW: usize = 6;

/// Keyword lists per intent, checked in order. The first list with a hit wins.
const INTENT_KEYWORDS: &[(&str, &[&str])] = &[
    ("healthcare", &[
        "health", "doctor", "hospital", "medicine", "vaccine", "treatment", "medical", "clinic", "surgery",
        "स्वास्थ्य", "डॉक्टर", "दवा", "इलाज", "टीका", "अस्पताल", "चिकित्सा", "दवाई", "बीमारी",
        "ডাক্তার", "চিকিৎসা", "ওষুধ", "হাসপাতাল",
        "వైద్యుడు", "ఆసుపత్రి", "మందు", "చికిత్స",
        "रुग्णालय", "औषध", "उपचार",
        "மருத்துவர்", "மருந்து", "மருத்துவமனை", "சிகிச்சை",
        "ડૉક્ટર", "દવા", "હોસ્પિટલ", "સારવાર",
        "ਡਾਕਟਰ", "ਦਵਾਈ", "ਹਸਪਤਾਲ", "ਇਲਾਜ",
    ]),
    ("employment", &[
        "job", "employment", "skill", "training", "work", "career", "placement", "unemployment",
        "नौकरी", "काम", "कौशल", "प्रशिक्षण", "रोजगार", "बेरोजगारी", "व्यवसाय",
        "চাকরি", "কাজ", "দক্ষতা", "প্রশিক্ষণ",
        "ఉద్యోగం", "పని", "నైపుణ్యం", "శిక్షణ",
        "नोकरी", "कौशल्य",
        "வேலை", "பணி", "திறன்", "பயிற்சி",
        "નોકરી", "કામ", "કૌશલ્ય", "તાલીમ",
        "ਨੌਕਰੀ", "ਕੰਮ", "ਹੁਨਰ", "ਸਿਖਲਾਈ",
    ]),
    ("education", &[
        "education", "school", "library", "study", "book", "scholarship", "learning", "course",
        "शिक्षा", "स्कूल", "पुस्तकालय", "पढ़ाई", "किताब", "छात्रवृत्ति", "अध्ययन",
        "শিক্ষা", "স্কুল", "লাইব্রেরি", "পড়াশোনা",
        "విద్య", "పాఠశాల", "గ్రంథాలయం", "చదువు",
        "शिक्षण", "शाळा", "ग्रंथालय", "अभ्यास",
        "கல்வி", "பள்ளி", "நூலகம்", "படிப்பு",
        "શિક્ષણ", "શાળા", "પુસ્તકાલય", "અભ્યાસ",
        "ਸਿੱਖਿਆ", "ਸਕੂਲ", "ਲਾਇਬ੍ਰੇਰੀ", "ਪੜ੍ਹਾਈ",
    ]),
    ("housing", &[
        "house", "home", "housing", "rent", "awas", "property", "accommodation",
        "घर", "आवास", "मकान", "किराया", "संपत्ति", "निवास",
        "ঘর", "বাড়ি", "আবাস", "ভাড়া",
        "ఇల్లు", "గృహం", "ఆవాసం", "అద్దె",
        "भाडे", "संपत्ती",
        "வீடு", "இல்லம்", "வாடகை", "சொத்து",
        "ઘર", "નિવાસ", "ભાડું", "મિલકત",
        "ਘਰ", "ਨਿਵਾਸ", "ਕਿਰਾਇਆ", "ਜਾਇਦਾਦ",
    ]),
    ("legal", &[
        "legal", "lawyer", "court", "case", "law", "justice", "advocate",
        "कानूनी", "वकील", "अदालत", "केस", "न्याय", "कानून",
        "আইনি", "উকিল", "আদালত", "মামলা",
        "న్యాయ", "న్యాయవాది", "కోర్టు", "కేసు",
        "कायदेशीर", "न्यायालय", "खटला",
        "சட்ட", "வக்கீல்", "நீதிமன்றம்", "வழக்கு",
        "કાનૂની", "વકીલ", "કોર્ટ", "કેસ",
        "ਕਾਨੂੰਨੀ", "ਵਕੀਲ", "ਅਦਾਲਤ", "ਕੇਸ",
    ]),
    ("transportation", &[
        "bus", "transport", "travel", "metro", "train", "vehicle", "traffic",
        "बस", "परिवहन", "यात्रा", "मेट्रो", "ट्रेन", "वाहन",
        "বাস", "পরিবহন", "ভ্রমণ", "মেট্রো",
        "బస్", "రవాణా", "ప్రయాణం", "మెట్రో",
        "वाहतूक", "प्रवास",
        "பேருந்து", "போக்குவரத்து", "பயணம்", "மெட்ரோ",
        "બસ", "પરિવહન", "મુસાફરી", "મેટ્રો",
        "ਬੱਸ", "ਆਵਾਜਾਈ", "ਸਫ਼ਰ", "ਮੈਟਰੋ",
    ]),
    ("welfare", &[
        "ration", "subsidy", "scheme", "benefit", "welfare", "pension", "allowance",
        "राशन", "सब्सिडी", "योजना", "लाभ", "कल्याण", "पेंशन",
        "রেশন", "ভর্তুকি", "প্রকল্প", "সুবিধা",
        "రేషన్", "సబ్సిడీ", "పథకం", "ప్రయోజనం",
        "रेशन", "अनुदान", "फायदा",
        "ரேஷன்", "மானியம்", "திட்டம்", "நன்மை",
        "રાશન", "સબસિડી", "યોજના", "લાભ",
        "ਰਾਸ਼ਨ", "ਸਬਸਿਡੀ", "ਸਕੀਮ", "ਫਾਇਦਾ",
    ]),
    ("documentation", &[
        "passport", "aadhaar", "pan", "license", "certificate", "document", "id", "card",
        "पासपोर्ट", "आधार", "पैन", "लाइसेंस", "प्रमाणपत्र", "दस्तावेज",
        "পাসপোর্ট", "আধার", "প্যান", "লাইসেন্স",
        "పాస్‌పోర్ట్", "ఆధార్", "పాన్", "లైసెన్స్",
        "पॅन", "परवाना",
        "கடவுச்சீட்டு", "ஆதார்", "பான்", "உரிமம்",
        "પાસપોર્ટ", "આધાર", "પાન", "લાયસન્સ",
        "ਪਾਸਪੋਰਟ", "ਆਧਾਰ", "ਪੈਨ", "ਲਾਇਸੈਂਸ",
    ]),
    ("financial", &[
        "bank", "loan", "tax", "money", "finance", "account", "payment", "insurance",
        "बैंक", "लोन", "टैक्स", "पैसा", "वित्त", "खाता", "भुगतान",
        "ব্যাংক", "ঋণ", "কর", "টাকা", "অর্থ",
        "బ్యాంకు", "రుణం", "పన్ను", "డబ్బు", "ఆర్థిక",
        "बँक", "कर्ज", "कर",
        "வங்கி", "கடன்", "வரி", "பணம்", "நிதி",
        "બેંક", "લોન", "ટેક્સ", "પૈસા", "નાણાં",
        "ਬੈਂਕ", "ਲੋਨ", "ਟੈਕਸ", "ਪੈਸਾ", "ਵਿੱਤ",
    ]),
    ("emergency", &[
        "emergency", "police", "fire", "ambulance", "disaster", "help", "urgent",
        "आपातकाल", "पुलिस", "आग", "एम्बुलेंस", "आपदा", "मदद",
        "জরুরি", "পুলিশ", "আগুন", "অ্যাম্বুলেন্স",
        "అత్యవసర", "పోలీసు", "అగ్ని", "అంబులెన్స్",
        "आपत्कालीन", "पोलिस", "रुग्णवाहिका",
        "அவசர", "காவல்", "தீ", "ஆம்புலன்ஸ்",
        "કટોકટી", "પોલીસ", "આગ", "એમ્બ્યુલન્સ",
        "ਐਮਰਜੈਂਸੀ", "ਪੁਲਿਸ", "ਅੱਗ", "ਐਂਬੂਲੈਂਸ",
    ]),
    ("utilities", &[
        "electricity", "water", "gas", "power", "supply", "connection", "bill",
        "बिजली", "पानी", "गैस", "आपूर्ति", "कनेक्शन", "बिल",
        "বিদ্যুৎ", "পানি", "গ্যাস", "সরবরাহ",
        "విద్యుత్", "నీరు", "గ్యాస్", "సరఫరా",
        "वीज", "पाणी", "गॅस", "पुरवठा",
        "மின்சாரம்", "தண்ணீர்", "எரிவாயு", "வழங்கல்",
        "વીજળી", "પાણી", "ગેસ", "પુરવઠો",
        "ਬਿਜਲੀ", "ਪਾਣੀ", "ਗੈਸ", "ਸਪਲਾਈ",
    ]),
    ("agriculture", &[
        "agriculture", "farming", "crop", "farmer", "seed", "fertilizer", "irrigation",
        "कृषि", "खेती", "फसल", "किसान", "बीज", "उर्वरक", "सिंचाई",
        "কৃষি", "চাষাবাদ", "ফসল", "কৃষক",
        "వ్యవసాయం", "పంట", "రైతు",
        "शेती", "पीक", "शेतकरी", "बियाणे",
        "விவசாயம்", "பயிர்", "விவசாயி", "விதை",
        "ખેતી", "પાક", "ખેડૂત", "બીજ",
        "ਖੇਤੀ", "ਫਸਲ", "ਕਿਸਾਨ", "ਬੀਜ",
    ]),
];

/// Follow-up prompts per intent as `(intent, english, hindi)`.
const SUGGESTIONS: &[(&str, [&str; 4], [&str; 4])] = &[
    ("healthcare",
        ["Where is the nearest PHC?", "How to get Ayushman Bharat card?", "Vaccination schedule information", "Generic medicine availability"],
        ["निकटतम PHC कहाँ है?", "आयुष्मान भारत कार्ड कैसे बनवाएं?", "टीकाकरण की जानकारी", "जेनेरिक दवाओं की उपलब्धता"]),
    ("employment",
        ["Free skill training programs", "How to apply for PMKVY?", "Job placement assistance", "Unemployment benefits"],
        ["मुफ्त कौशल प्रशिक्षण कार्यक्रम", "PMKVY के लिए आवेदन कैसे करें?", "नौकरी प्लेसमेंट सहायता", "बेरोजगारी भत्ता"]),
    ("education",
        ["Library membership process", "Free computer training", "Scholarship information", "Adult education programs"],
        ["पुस्तकालय सदस्यता प्रक्रिया", "मुफ्त कंप्यूटर प्रशिक्षण", "छात्रवृत्ति की जानकारी", "वयस्क शिक्षा कार्यक्रम"]),
    ("housing",
        ["PM Awas Yojana eligibility", "Housing subsidy application", "Affordable housing schemes", "Rental assistance programs"],
        ["PM आवास योजना की पात्रता", "आवास सब्सिडी आवेदन", "किफायती आवास योजनाएं", "किराया सहायता कार्यक्रम"]),
    ("legal",
        ["Free legal aid eligibility", "How to file a complaint?", "Legal consultation process", "Court fee exemption"],
        ["मुफ्त कानूनी सहायता की पात्रता", "शिकायत कैसे दर्ज करें?", "कानूनी परामर्श प्रक्रिया", "कोर्ट फीस छूट"]),
    ("transportation",
        ["Bus route information", "Student concession process", "Metro connectivity", "Senior citizen benefits"],
        ["बस रूट की जानकारी", "छात्र रियायत प्रक्रिया", "मेट्रो कनेक्टिविटी", "वरिष्ठ नागरिक लाभ"]),
    ("welfare",
        ["Ration card application", "Available subsidy schemes", "BPL certificate process", "Food security programs"],
        ["राशन कार्ड आवेदन", "उपलब्ध सब्सिडी योजनाएं", "BPL प्रमाणपत्र प्रक्रिया", "खाद्य सुरक्षा कार्यक्रम"]),
    ("documentation",
        ["Passport application process", "Aadhaar card update", "PAN card services", "Driving license"],
        ["पासपोर्ट आवेदन प्रक्रिया", "आधार कार्ड अपडेट", "PAN कार्ड सेवाएं", "ड्राइविंग लाइसेंस"]),
    ("financial",
        ["Bank account opening", "Government loan schemes", "Tax filing assistance", "Insurance schemes"],
        ["बैंक खाता खोलना", "सरकारी लोन योजनाएं", "टैक्स फाइलिंग सहायता", "बीमा योजनाएं"]),
    ("emergency",
        ["Emergency numbers", "Police station contact", "Fire service", "Ambulance service"],
        ["आपातकालीन नंबर", "पुलिस स्टेशन संपर्क", "अग्निशमन सेवा", "एम्बुलेंस सेवा"]),
    ("utilities",
        ["Electricity connection", "Water supply", "Gas connection", "Bill payment"],
        ["बिजली कनेक्शन", "पानी की आपूर्ति", "गैस कनेक्शन", "बिल भुगतान"]),
    ("agriculture",
        ["Agricultural technology training", "Seed distribution", "Soil testing", "Crop advisory"],
        ["कृषि तकनीक प्रशिक्षण", "बीज वितरण", "मिट्टी परीक्षण", "फसल सलाह"]),
    ("general",
        ["Health services near me", "Employment opportunities", "Education resources", "Housing assistance"],
        ["मेरे पास स्वास्थ्य सेवाएं", "रोजगार के अवसर", "शिक्षा संसाधन", "आवास सहायता"]),
];

const LANGUAGE_INSTRUCTIONS: &[(&str, &str)] = &[
    ("hi", "Please respond primarily in Hindi (Devanagari script) with English terms in parentheses where helpful. Use respectful language with आप and appropriate honorifics."),
    ("bn", "Please respond primarily in Bengali (Bengali script) with English terms in parentheses where helpful. Use respectful language with আপনি."),
    ("te", "Please respond primarily in Telugu (Telugu script) with English terms in parentheses where helpful. Use respectful language with మీరు."),
    ("ta", "Please respond primarily in Tamil (Tamil script) with English terms in parentheses where helpful. Use respectful language with நீங்கள்."),
    ("gu", "Please respond primarily in Gujarati (Gujarati script) with English terms in parentheses where helpful. Use respectful language with તમે."),
    ("mr", "Please respond primarily in Marathi (Devanagari script) with English terms in parentheses where helpful. Use respectful language with तुम्ही."),
    ("pa", "Please respond primarily in Punjabi (Gurmukhi script) with English terms in parentheses where helpful. Use respectful language with ਤੁਸੀਂ."),
    ("kn", "Please respond primarily in Kannada (Kannada script) with English terms in parentheses where helpful. Use respectful language with ನೀವು."),
    ("ml", "Please respond primarily in Malayalam (Malayalam script) with English terms in parentheses where helpful. Use respectful language with നിങ്ങൾ."),
    ("or", "Please respond primarily in Odia (Odia script) with English terms in parentheses where helpful. Use respectful language with ଆପଣ."),
    ("as", "Please respond primarily in Assamese (Bengali script) with English terms in parentheses where helpful. Use respectful language with আপুনি."),
    ("ur", "Please respond primarily in Urdu (Arabic script) with English terms in parentheses where helpful. Use respectful language with آپ."),
    ("en", "Please respond in clear, simple English with Hindi terms in parentheses where helpful for Indian context."),
];

pub fn classify_intent(message: &str) -> &'static str {
    let message = message.to_lowercase();
    INTENT_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| message.contains(k)))
        .map(|(intent, _)| *intent)
        .unwrap_or("general")
}

/// Service category an intent maps onto, when the catalog has one.
pub fn intent_category(intent: &str) -> Option<&'static str> {
    match intent {
        "healthcare" => Some("healthcare"),
        "employment" => Some("employment"),
        "education" => Some("education"),
        "housing" => Some("housing"),
        "legal" => Some("legal"),
        "transportation" => Some("transportation"),
        "utilities" => Some("utilities"),
        "emergency" => Some("emergency"),
        "documentation" => Some("identity-documents"),
        "financial" => Some("financial-services"),
        "welfare" => Some("social-welfare"),
        _ => None,
    }
}

pub fn suggestions(intent: &str, language: &str) -> Vec<String> {
    let (_, en, hi) = SUGGESTIONS
        .iter()
        .find(|(i, _, _)| *i == intent)
        .or_else(|| SUGGESTIONS.iter().find(|(i, _, _)| *i == "general"))
        .copied()
        .unwrap_or(("general", [""; 4], [""; 4]));

    let list = if language == "hi" { hi } else { en };
    list.iter().take(MAX_SUGGESTIONS).map(|s| s.to_string()).collect()
}

pub fn language_instruction(language: &str) -> &'static str {
    LANGUAGE_INSTRUCTIONS
        .iter()
        .find(|(code, _)| *code == language)
        .or_else(|| LANGUAGE_INSTRUCTIONS.iter().find(|(code, _)| *code == "en"))
        .map(|(_, text)| *text)
        .unwrap_or_default()
}

/// Deterministic answer used when no AI provider responds.
pub fn fallback_response(message: &str, language: &str, top_service: Option<&Service>) -> String {
    let hindi = language == "hi";

    let Some(service) = top_service else {
        return if hindi {
            format!("मैं आपके प्रश्न \"{}\" को समझता हूं। हालांकि मेरे पास इस समय इससे मेल खाती विशिष्ट सेवाएं नहीं हैं, मैं आपको अपने स्थानीय सरकारी कार्यालय से संपर्क करने या निकटतम नागरिक सेवा केंद्र पर जाने की सलाह देता हूं।\n\nसामान्य सरकारी सेवाओं के लिए नागरिक हेल्पलाइन: 1950\n\nअधिक जानकारी के लिए कृपया संबंधित विभाग से संपर्क करें।", message)
        } else {
            format!("I understand you're asking about \"{}\". While I don't have specific services matching your query right now, I recommend contacting your local government office or visiting the nearest citizen service center for assistance.\n\nCitizen helpline for general government services: 1950\n\nPlease contact the relevant department for more information.", message)
        };
    };

    let phone = service.contact.phone.as_deref().unwrap_or("1950");
    let eligibility = service.eligibility.join(", ");

    if hindi {
        format!("आपके प्रश्न \"{}\" के आधार पर, मुझे यह प्रासंगिक सेवा मिली:\n\n**{}**\n{}\n\n**विभाग:** {}\n**संपर्क:** {}\n**पात्रता:** {}\n\nविस्तृत जानकारी और आवेदन प्रक्रिया के लिए, कृपया विभाग से सीधे संपर्क करें या उनके कार्यालय में जाएं।\n\n*अस्वीकरण: यह सामान्य जानकारी है। कृपया आधिकारिक विभाग से विवरण की पुष्टि करें।*",
            message, service.name, service.description, service.department, phone, eligibility)
    } else {
        format!("Based on your query about \"{}\", I found this relevant service:\n\n**{}**\n{}\n\n**Department:** {}\n**Contact:** {}\n**Eligibility:** {}\n\nFor detailed information and application process, please contact the department directly or visit their office.\n\n*Disclaimer: This is general information. Please verify details with the official department.*",
            message, service.name, service.description, service.department, phone, eligibility)
    }
}

/// Active services whose category matches the intent, or whose tags appear in the message.
/// General queries match name, description or department against the message instead.
pub fn relevant_services_filter(intent: &str, message: &str) -> Document {
    let lowered = message.to_lowercase();
    let tag_in_message = doc! {
        "$expr": {
            "$gt": [
                { "$size": {
                    "$filter": {
                        "input": { "$ifNull": ["$tags", []] },
                        "cond": { "$gte": [{ "$indexOfCP": [&lowered, { "$toLower": "$$this" }] }, 0] }
                    }
                } },
                0
            ]
        }
    };

    let mut alternatives = vec![tag_in_message];
    match intent_category(intent) {
        Some(category) => alternatives.push(doc! { "category": category }),
        None if intent == "general" => {
            let pattern = escape_regex(message.trim());
            for field in ["name", "description", "department"] {
                alternatives.push(doc! { field: { "$regex": &pattern, "$options": "i" } });
            }
        }
        None => {}
    }

    doc! { "isActive": true, "$or": alternatives }
}

pub async fn find_relevant_services(db: &MongoDB, intent: &str, message: &str) -> Result<Vec<Service>, String> {
    db.collection::<Service>(Service::COLLECTION)
        .find(relevant_services_filter(intent, message))
        .sort(doc! { "rating.average": -1 })
        .limit(MAX_RELEVANT_SERVICES)
        .await
        .map_err(|e| format!("Failed to query services: {}", e))?
        .try_collect()
        .await
        .map_err(|e| format!("Failed to read services: {}", e))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceContext<'a> {
    name: &'a str,
    description: &'a str,
    department: &'a str,
    eligibility: &'a [String],
    requirements: &'a [String],
    contact: Option<&'a str>,
    rating: f64,
}

pub fn build_chat_prompt(message: &str, intent: &str, language: &str, services: &[Service], history: &[ChatMessage]) -> String {
    let context: Vec<ServiceContext> = services
        .iter()
        .map(|s| ServiceContext {
            name: &s.name,
            description: &s.description,
            department: &s.department,
            eligibility: &s.eligibility,
            requirements: &s.requirements,
            contact: s.contact.phone.as_deref(),
            rating: s.rating.average,
        })
        .collect();
    let services_json = serde_json::to_string_pretty(&context).unwrap_or_else(|_| "[]".to_string());

    let mut prompt = String::new();
    if !history.is_empty() {
        prompt.push_str("Previous conversation:\n");
        for msg in history {
            let speaker = match msg.role {
                MessageRole::User => "User",
                MessageRole::Assistant => "Assistant",
            };
            prompt.push_str(&format!("{}: {}\n", speaker, msg.content));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "User Query: \"{}\"\nIntent: {}\nLanguage Preference: {}\nRelevant Services: {}\n\n{}\n\n",
        message,
        intent,
        language,
        services_json,
        language_instruction(language)
    ));
    prompt.push_str("Please provide a comprehensive, helpful response that:
1. Addresses the user's query directly and thoroughly
2. Explains relevant services in simple, accessible terms
3. Provides specific eligibility criteria and requirements
4. Includes contact information and next steps
5. Mentions relevant government schemes and their benefits
6. Includes appropriate disclaimers for health/legal/financial matters
7. Uses culturally appropriate language and context for India

Keep the response informative yet conversational, helpful, and under 300 words.");
    prompt
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantReply {
    pub response: String,
    pub intent: String,
    pub relevant_services: Vec<Service>,
    pub suggestions: Vec<String>,
    pub language: String,
    pub provider: Option<&'static str>,
}

impl AssistantReply {
    pub fn service_ids(&self) -> Vec<String> {
        self.relevant_services
            .iter()
            .filter_map(|s| s.id.map(|id| id.to_hex()))
            .collect()
    }
}

/// Civic chat assistant: intent detection, service lookup and an LLM answer
/// with a template fallback.
pub struct Assistant<'a> {
    db: &'a MongoDB,
    llm: &'a ProviderChain,
}

impl<'a> Assistant<'a> {
    pub fn new(db: &'a MongoDB, llm: &'a ProviderChain) -> Self {
        Self { db, llm }
    }

    pub async fn process_query(&self, message: &str, language: &str, history: &[ChatMessage]) -> Result<AssistantReply, String> {
        let intent = classify_intent(message);
        let services = find_relevant_services(self.db, intent, message).await?;

        log::info!("🤖 Chat query intent={} services={}", intent, services.len());

        let request = CompletionRequest::new(build_chat_prompt(message, intent, language, &services, history))
            .with_system(CIVIC_SYSTEM_PROMPT);

        let (response, provider) = match self.llm.complete(&request).await {
            Ok(completion) => (completion.text, Some(completion.provider)),
            Err(e) => {
                log::warn!("⚠️ Using template response: {}", e);
                (fallback_response(message, language, services.first()), None)
            }
        };

        Ok(AssistantReply {
            response,
            intent: intent.to_string(),
            relevant_services: services,
            suggestions: suggestions(intent, language),
            language: language.to_string(),
            provider,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ServiceCategory, ServiceContact};

    #[test]
    fn test_classify_intent_order_and_languages() {
        assert_eq!(classify_intent("Where is the nearest hospital?"), "healthcare");
        assert_eq!(classify_intent("मुझे नौकरी चाहिए"), "employment");
        assert_eq!(classify_intent("How do I renew my PASSPORT"), "documentation");
        assert_eq!(classify_intent("ரேஷன் அட்டை"), "welfare");
        assert_eq!(classify_intent("hello there"), "general");
        // "doctor" (healthcare) is checked before "training" (employment)
        assert_eq!(classify_intent("doctor training"), "healthcare");
    }

    #[test]
    fn test_suggestions_fall_back_to_general_and_english() {
        assert_eq!(suggestions("healthcare", "en")[0], "Where is the nearest PHC?");
        assert_eq!(suggestions("healthcare", "hi")[0], "निकटतम PHC कहाँ है?");
        assert_eq!(suggestions("unknown", "ta")[0], "Health services near me");
        assert_eq!(suggestions("legal", "en").len(), 4);
    }

    #[test]
    fn test_language_instruction_defaults_to_english() {
        assert!(language_instruction("ta").contains("Tamil"));
        assert_eq!(language_instruction("xx"), language_instruction("en"));
    }

    #[test]
    fn test_fallback_mentions_top_service_and_helpline() {
        let service = Service {
            name: "Ayushman Bharat PMJAY".into(),
            description: "Health cover of 5 lakh per family".into(),
            category: ServiceCategory::Healthcare,
            department: "National Health Authority".into(),
            contact: ServiceContact {
                phone: Some("14555".into()),
                ..ServiceContact::default()
            },
            eligibility: vec!["SECC listed families".into()],
            ..Service::default()
        };

        let with_service = fallback_response("health card", "en", Some(&service));
        assert!(with_service.contains("**Ayushman Bharat PMJAY**"));
        assert!(with_service.contains("**Contact:** 14555"));

        let without = fallback_response("health card", "hi", None);
        assert!(without.contains("1950"));
        assert!(without.contains("\"health card\""));
    }

    #[test]
    fn test_relevant_services_filter() {
        let filter = relevant_services_filter("documentation", "aadhaar update");
        assert_eq!(filter.get_bool("isActive").unwrap(), true);
        let alternatives = filter.get_array("$or").unwrap();
        assert_eq!(alternatives.len(), 2);
        assert_eq!(
            alternatives[1].as_document().unwrap().get_str("category").unwrap(),
            "identity-documents"
        );

        let general = relevant_services_filter("general", "digilocker (app)");
        let alternatives = general.get_array("$or").unwrap();
        assert_eq!(alternatives.len(), 4);
        let name = alternatives[1].as_document().unwrap().get_document("name").unwrap();
        assert_eq!(name.get_str("$regex").unwrap(), "digilocker \\(app\\)");
    }

    #[test]
    fn test_chat_prompt_includes_history_and_instruction() {
        let history = vec![ChatMessage::user("I need a PAN card", "en")];
        let prompt = build_chat_prompt("how long does it take?", "general", "hi", &[], &history);
        assert!(prompt.starts_with("Previous conversation:\nUser: I need a PAN card\n"));
        assert!(prompt.contains("Intent: general"));
        assert!(prompt.contains("Relevant Services: []"));
        assert!(prompt.contains("Hindi (Devanagari script)"));
    }
}
