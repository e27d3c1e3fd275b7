//! Domain lexicon
//!
//! Keyword evidence about whether a query is about agriculture. The intent
//! gate uses it only to reject clearly off-topic queries without a
//! classifier round trip; it never admits a query on its own.

use regex::Regex;

use crate::pattern::{build_term_pattern, lookup_key};
use crate::Result;

const AGRICULTURE_TERMS: &[&str] = &[
    // products
    "dormulin", "zetol", "tracs", "akre", "trail blaze", "actin",
    // crops and plant parts
    "agriculture", "farming", "farm", "farmer", "crop", "crops", "plant", "plants", "seed",
    "seeds", "sett", "chilli", "tomato", "banana", "carrot", "carrots", "vegetable",
    "vegetables", "leaf", "leaves", "shoot", "stem", "root", "roots", "flower", "flowers",
    "fruit", "fruits", "seedling", "canopy", "inflorescence",
    // growing
    "grow", "grows", "growing", "cultivate", "cultivation", "sowing", "planting",
    "transplanting", "harvest", "yield", "irrigation", "fertigation", "drenching",
    "ploughing", "pruning", "germination", "vegetative", "flowering", "fruiting", "rooting",
    // inputs
    "fertilizer", "fertilizers", "manure", "compost", "pesticide", "herbicide", "fungicide",
    "insecticide", "mancozeb", "imidacloprid", "trichoderma", "foliar", "spray", "soil",
    "granules", "dosage", "acre", "hectare",
    // pests and diseases
    "pest", "pests", "disease", "thrips", "aphids", "mites", "whiteflies", "jassids",
    "caterpillar", "borer", "nematodes", "weevil", "blight", "mildew", "wilt", "rot",
    "fusarium", "alternaria", "sigatoka", "chlorosis", "dieback", "damping off",
    // nutrients
    "nutrient", "deficiency", "nitrogen", "phosphorus", "potash", "potassium", "zinc",
    "boron", "iron",
    // conditions
    "drought", "moisture", "abiotic stress",
];

const OFF_DOMAIN_TERMS: &[&str] = &[
    // technology
    "smartphone", "smartphones", "phone", "mobile", "laptop", "laptops", "computer",
    "gadget", "software", "app", "gaming", "internet", "website", "programming", "python",
    "coding", "developer",
    // entertainment and sport
    "movie", "movies", "entertainment", "sports", "cricket", "football", "tennis", "gym",
    "workout", "fitness", "music", "song", "dance", "youtube", "netflix", "streaming",
    // finance
    "business", "finance", "investment", "stock", "trading", "cryptocurrency", "bitcoin",
    "mutual fund", "bank", "loan", "insurance", "mortgage",
    // travel
    "travel", "restaurant", "hotel", "vacation", "tourism", "flight", "booking", "visa",
    "passport",
    // health
    "diabetes", "blood pressure", "doctor", "hospital", "surgery", "therapy", "skincare",
    // education and career
    "university", "college", "exam", "upsc", "mba", "resume", "job", "career", "interview",
    "salary",
    // lifestyle
    "wedding", "fashion", "shopping", "recipe", "yoga", "meditation",
];

/// Specific diseases, pests and products a grounded answer can focus on
const FOCUS_TERMS: &[&str] = &[
    "late blight",
    "early blight",
    "bacterial wilt",
    "powdery mildew",
    "root rot",
    "fusarium wilt",
    "thrips",
    "aphids",
    "whiteflies",
    "dormulin",
    "zetol",
    "tracs",
];

/// Terms found in a query, lowercased, in order of first appearance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LexiconScan {
    pub agriculture: Vec<String>,
    pub off_domain: Vec<String>,
}

impl LexiconScan {
    /// Off-domain vocabulary and nothing agricultural
    pub fn is_clearly_off_domain(&self) -> bool {
        self.agriculture.is_empty() && !self.off_domain.is_empty()
    }

    pub fn has_agriculture_terms(&self) -> bool {
        !self.agriculture.is_empty()
    }
}

/// Compiled agriculture / off-domain / focus term sets
#[derive(Debug, Clone)]
pub struct DomainLexicon {
    agriculture: Option<Regex>,
    off_domain: Option<Regex>,
    focus_terms: Vec<String>,
    focus: Option<Regex>,
}

impl DomainLexicon {
    pub fn new<A, O, F>(agriculture: A, off_domain: O, focus_terms: F) -> Result<Self>
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        O: IntoIterator,
        O::Item: AsRef<str>,
        F: IntoIterator,
        F::Item: AsRef<str>,
    {
        let agriculture: Vec<String> = agriculture.into_iter().map(|t| lookup_key(t.as_ref())).collect();
        let off_domain: Vec<String> = off_domain.into_iter().map(|t| lookup_key(t.as_ref())).collect();
        let focus_terms: Vec<String> = focus_terms
            .into_iter()
            .map(|t| lookup_key(t.as_ref()))
            .filter(|t| !t.is_empty())
            .collect();

        Ok(Self {
            agriculture: build_term_pattern(agriculture.iter().map(String::as_str))?,
            off_domain: build_term_pattern(off_domain.iter().map(String::as_str))?,
            focus: build_term_pattern(focus_terms.iter().map(String::as_str))?,
            focus_terms,
        })
    }

    /// Agriculture, off-domain and focus term lists used in production
    pub fn builtin() -> Result<Self> {
        Self::new(AGRICULTURE_TERMS, OFF_DOMAIN_TERMS, FOCUS_TERMS)
    }

    pub fn scan(&self, text: &str) -> LexiconScan {
        LexiconScan {
            agriculture: find_terms(self.agriculture.as_ref(), text),
            off_domain: find_terms(self.off_domain.as_ref(), text),
        }
    }

    /// Focus terms named in the query, in focus-list priority order
    pub fn focus_terms(&self, text: &str) -> Vec<String> {
        let found = find_terms(self.focus.as_ref(), text);
        self.focus_terms
            .iter()
            .filter(|t| found.contains(t))
            .cloned()
            .collect()
    }
}

fn find_terms(pattern: Option<&Regex>, text: &str) -> Vec<String> {
    let Some(pattern) = pattern else {
        return Vec::new();
    };

    let mut found: Vec<String> = Vec::new();
    for m in pattern.find_iter(text) {
        let term = lookup_key(m.as_str());
        if !found.contains(&term) {
            found.push(term);
        }
    }
    found
}
