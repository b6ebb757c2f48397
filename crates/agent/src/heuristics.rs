//! Plan-skip heuristic.
//!
//! Short, direct weather questions and very short utterances do not
//! benefit from an explicit planning round and would only pay its latency;
//! anything mentioning trips, itineraries, or places always gets a plan
//! regardless of length. Pure functions of the message text, independent
//! of conversation history.

const WEATHER_KEYWORDS: &[&str] = &[
    "weather",
    "forecast",
    "temperature",
    "temp",
    "rain",
    "wind",
    "humidity",
    "humid",
    "cloud",
    "sun",
    "snow",
];

const PLACES_KEYWORDS: &[&str] = &[
    "itinerary",
    "plan a trip",
    "trip",
    "things to do",
    "what to do",
    "recommend",
    "suggest",
    "where to eat",
    "restaurant",
    "restaurants",
    "museum",
    "museums",
    "park",
    "parks",
    "places",
    "poi",
];

fn is_weather_query(text: &str) -> bool {
    let t = text.to_lowercase();
    WEATHER_KEYWORDS.iter().any(|k| t.contains(k))
}

fn wants_places_or_itinerary(text: &str) -> bool {
    let t = text.to_lowercase();
    PLACES_KEYWORDS.iter().any(|k| t.contains(k))
}

/// Decide whether to run the planning round for this user message.
///
/// Rules, in priority order:
/// 1. blank input → never plan
/// 2. trip/places keyword → always plan
/// 3. weather keyword and at most 10 words → skip the plan
/// 4. at most 6 words → skip the plan
/// 5. otherwise → plan
pub fn should_use_plan(user_message: &str) -> bool {
    let t = user_message.trim();
    if t.is_empty() {
        return false;
    }
    if wants_places_or_itinerary(t) {
        return true;
    }
    let words = t.split_whitespace().count();
    if is_weather_query(t) && words <= 10 {
        return false;
    }
    if words <= 6 {
        return false;
    }
    true
}
