//! Fixed prompt sent with every extraction request.

/// The closed category vocabulary accepted by the stock agency.
pub const CATEGORIES: [&str; 26] = [
    "Abstract",
    "Animals/Wildlife",
    "Arts",
    "Backgrounds/Textures",
    "Beauty/Fashion",
    "Buildings/Landmarks",
    "Business/Finance",
    "Celebrities",
    "Education",
    "Food and Drink",
    "Healthcare/Medical",
    "Holidays",
    "Industrial",
    "Interiors",
    "Miscellaneous",
    "Nature",
    "Objects",
    "Parks/Outdoor",
    "People",
    "Religion",
    "Science",
    "Signs/Symbols",
    "Sports/Recreation",
    "Technology",
    "Transportation",
    "Vintage",
];

pub const MAX_DESCRIPTION_CHARS: usize = 200;
pub const MIN_KEYWORDS: usize = 5;
pub const MAX_KEYWORDS: usize = 15;
pub const MIN_CATEGORIES: usize = 1;
pub const MAX_CATEGORIES: usize = 2;

pub const USER_PROMPT: &str =
    "Analyze this image and generate Shutterstock metadata in JSON format.";

/// System instruction describing the field contract of the response.
pub fn system_instruction() -> String {
    format!(
        "You are an expert stock photography metadata specialist.\n\
         Your task is to analyze images and generate metadata specifically formatted for Shutterstock.\n\
         Return ONLY a raw JSON object. Do not include markdown formatting like ```json.\n\
         \n\
         Required Fields:\n\
         1. description: A concise, descriptive sentence (max {max_desc} chars).\n\
         2. keywords: A single string containing {min_kw} to {max_kw} keywords separated by commas.\n\
         3. categories: A single string with {min_cat} or {max_cat} categories from this standard list: {categories}.\n\
         4. editorial: \"yes\" or \"no\" (is it newsworthy/public figure?).\n\
         5. mature_content: \"yes\" or \"no\".\n\
         6. illustration: \"yes\" or \"no\".\n",
        max_desc = MAX_DESCRIPTION_CHARS,
        min_kw = MIN_KEYWORDS,
        max_kw = MAX_KEYWORDS,
        min_cat = MIN_CATEGORIES,
        max_cat = MAX_CATEGORIES,
        categories = CATEGORIES.join(", "),
    )
}

/// Case-insensitive lookup in [`CATEGORIES`].
pub fn is_known_category(name: &str) -> bool {
    let name = name.trim();
    CATEGORIES.iter().any(|c| c.eq_ignore_ascii_case(name))
}
