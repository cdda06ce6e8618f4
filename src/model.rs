use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Page content returned by a single fetch attempt
#[derive(Debug, Clone)]
pub struct RawContent {
    pub url: String,
    pub body: String,
    pub fetched_at: DateTime<Utc>,
    pub content_type: String,
}

impl RawContent {
    pub fn new(url: impl Into<String>, body: impl Into<String>, content_type: impl Into<String>) -> Self {
        RawContent {
            url: url.into(),
            body: body.into(),
            fetched_at: Utc::now(),
            content_type: content_type.into(),
        }
    }

    /// Whether the body should be parsed as an HTML document
    pub fn is_html(&self) -> bool {
        let content_type = self.content_type.to_ascii_lowercase();
        content_type.contains("html")
            || (content_type.is_empty() && self.body.trim_start().starts_with('<'))
    }
}

/// Strategy that produced an [`ExtractionResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Ai,
    RuleBased,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Ai => "ai",
            ExtractionMethod::RuleBased => "rule_based",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic record attached to every extraction and surfaced in [`ImportResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    pub method_used: ExtractionMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_detected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Page parser or provider that produced the draft
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
}

impl ExtractionMetadata {
    pub fn new(method_used: ExtractionMethod) -> Self {
        ExtractionMetadata {
            method_used,
            language_detected: None,
            extracted_title: None,
            confidence: None,
            parser: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedIngredient {
    pub name: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedApplianceSetting {
    pub appliance_type: String,
    #[serde(default)]
    pub temperature_celsius: Option<u32>,
    #[serde(default)]
    pub heat_level: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub utensils: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Unvalidated recipe draft produced by one extraction strategy.
///
/// Times, servings and difficulty are kept as free text; the
/// [`Transformer`](crate::transformer::Transformer) normalizes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub title: Option<String>,
    pub description: Option<String>,
    pub ingredients: Vec<ExtractedIngredient>,
    pub instructions: Vec<String>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub servings: Option<String>,
    pub difficulty: Option<String>,
    pub tags: Vec<String>,
    pub meal_times: Vec<String>,
    pub appliance_settings: Vec<ExtractedApplianceSetting>,
    pub images: Vec<String>,
    pub extraction_metadata: ExtractionMetadata,
}

impl ExtractionResult {
    pub fn empty(method: ExtractionMethod) -> Self {
        ExtractionResult {
            title: None,
            description: None,
            ingredients: Vec::new(),
            instructions: Vec::new(),
            prep_time: None,
            cook_time: None,
            servings: None,
            difficulty: None,
            tags: Vec::new(),
            meal_times: Vec::new(),
            appliance_settings: Vec::new(),
            images: Vec::new(),
            extraction_metadata: ExtractionMetadata::new(method),
        }
    }

    /// A draft is usable when it has a title and at least one ingredient or instruction
    pub fn is_usable(&self) -> bool {
        let has_title = self
            .title
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false);
        let has_ingredients = self.ingredients.iter().any(|i| !i.name.trim().is_empty());
        let has_instructions = self.instructions.iter().any(|s| !s.trim().is_empty());

        has_title && (has_ingredients || has_instructions)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub amount: String,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(rename = "type")]
    pub source_type: String,
    pub url: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealTime {
    Breakfast,
    Brunch,
    Lunch,
    Dinner,
    Snack,
    Dessert,
}

impl MealTime {
    pub const ALL: [MealTime; 6] = [
        MealTime::Breakfast,
        MealTime::Brunch,
        MealTime::Lunch,
        MealTime::Dinner,
        MealTime::Snack,
        MealTime::Dessert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealTime::Breakfast => "breakfast",
            MealTime::Brunch => "brunch",
            MealTime::Lunch => "lunch",
            MealTime::Dinner => "dinner",
            MealTime::Snack => "snack",
            MealTime::Dessert => "dessert",
        }
    }
}

impl FromStr for MealTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        MealTime::ALL
            .into_iter()
            .find(|meal| meal.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown meal time '{wanted}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplianceType {
    GasBurner,
    Airfryer,
    ElectricGrill,
    ElectricStove,
    InductionStove,
    Oven,
    CharcoalGrill,
    Stove,
}

impl ApplianceType {
    pub const ALL: [ApplianceType; 8] = [
        ApplianceType::GasBurner,
        ApplianceType::Airfryer,
        ApplianceType::ElectricGrill,
        ApplianceType::ElectricStove,
        ApplianceType::InductionStove,
        ApplianceType::Oven,
        ApplianceType::CharcoalGrill,
        ApplianceType::Stove,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplianceType::GasBurner => "gas_burner",
            ApplianceType::Airfryer => "airfryer",
            ApplianceType::ElectricGrill => "electric_grill",
            ApplianceType::ElectricStove => "electric_stove",
            ApplianceType::InductionStove => "induction_stove",
            ApplianceType::Oven => "oven",
            ApplianceType::CharcoalGrill => "charcoal_grill",
            ApplianceType::Stove => "stove",
        }
    }
}

impl FromStr for ApplianceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace([' ', '-'], "_");
        ApplianceType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unknown appliance type '{}'", s.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplianceSetting {
    pub appliance_type: ApplianceType,
    pub temperature_celsius: Option<u32>,
    pub heat_level: Option<String>,
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub utensils: Vec<String>,
    pub notes: Option<String>,
}

/// Canonical, validated recipe as handed to the repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub title: String,
    pub description: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    /// Minutes
    pub prep_time: Option<u32>,
    /// Minutes
    pub cook_time: Option<u32>,
    pub servings: Option<u32>,
    pub difficulty: Option<Difficulty>,
    pub tags: BTreeSet<String>,
    pub meal_times: BTreeSet<MealTime>,
    pub source: Source,
    pub images: Vec<String>,
    #[serde(default)]
    pub appliance_settings: Vec<ApplianceSetting>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

/// Caller-supplied additions applied on top of an extraction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportMetadata {
    #[serde(default)]
    pub additional_tags: Vec<String>,
    #[serde(default)]
    pub meal_times: Vec<String>,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
    /// Free-form entries merged into [`Recipe::metadata`]
    #[serde(default)]
    pub extra: BTreeMap<String, Value>,
}

/// Report of one terminal pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub success: bool,
    pub recipe_id: Option<String>,
    pub url: String,
    pub attempts: u32,
    pub error: Option<String>,
    pub extraction_metadata: Option<ExtractionMetadata>,
    pub timestamp: DateTime<Utc>,
}

impl ImportResult {
    pub fn succeeded(
        url: impl Into<String>,
        recipe_id: impl Into<String>,
        attempts: u32,
        extraction_metadata: Option<ExtractionMetadata>,
    ) -> Self {
        ImportResult {
            success: true,
            recipe_id: Some(recipe_id.into()),
            url: url.into(),
            attempts: attempts.max(1),
            error: None,
            extraction_metadata,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(
        url: impl Into<String>,
        error: impl Into<String>,
        attempts: u32,
        extraction_metadata: Option<ExtractionMetadata>,
    ) -> Self {
        ImportResult {
            success: false,
            recipe_id: None,
            url: url.into(),
            attempts: attempts.max(1),
            error: Some(error.into()),
            extraction_metadata,
            timestamp: Utc::now(),
        }
    }
}

/// One entry per distinct input URL
pub type BatchImportResult = HashMap<String, ImportResult>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStatus {
    pub ai_available: bool,
    pub fallback_available: bool,
}

/// Whether a URL already produced a stored recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportStatus {
    Exists { recipe_id: String, title: String },
    NotImported { url: String },
}
