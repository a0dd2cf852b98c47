use crate::{
    extract::{landmarks::lookup_landmark, RequiredEntitySet},
    types::DayPlan,
};

/// Required names that no activity name mentions, in the set's order.
///
/// Matching is a case-insensitive substring test, so `"浅草寺"` is covered by
/// an activity called `"浅草寺与仲见世商店街"`. A well-known landmark is also
/// covered by any of its aliases: `"大本钟"` by `"Big Ben at dusk"`.
pub fn missing_entities(itinerary: &[DayPlan], required: &RequiredEntitySet) -> Vec<String> {
    if required.is_empty() {
        return Vec::new();
    }

    let activity_names: Vec<String> = itinerary
        .iter()
        .flat_map(|day| day.activity_names())
        .map(str::to_lowercase)
        .collect();

    required
        .iter()
        .filter(|name| {
            let needles: Vec<String> = match lookup_landmark(name) {
                Some(landmark) => landmark.spellings().map(str::to_lowercase).collect(),
                None => vec![name.to_lowercase()],
            };
            !activity_names
                .iter()
                .any(|activity| needles.iter().any(|needle| activity.contains(needle.as_str())))
        })
        .map(str::to_string)
        .collect()
}

/// Traveller-facing note listing the requested attractions the itinerary left out.
pub fn coverage_warning(missing: &[String]) -> String {
    format!(
        "⚠️ 注意：行程中没有包含您指定的景点：{}。可以重新生成行程，或手动把它们加进去。",
        missing.join("、")
    )
}

/// Append the warning to the suggestions text, keeping whatever the model wrote.
pub(crate) fn append_warning(suggestions: &str, missing: &[String]) -> String {
    let warning = coverage_warning(missing);
    if suggestions.trim().is_empty() {
        warning
    } else {
        format!("{}\n\n{}", suggestions.trim_end(), warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Activity, ActivityKind};

    fn day(names: &[&str]) -> DayPlan {
        DayPlan {
            day: Some(1),
            activities: names
                .iter()
                .map(|name| Activity::new(*name, ActivityKind::Attraction))
                .collect(),
            ..DayPlan::default()
        }
    }

    #[test]
    fn test_substring_counts_as_covered() {
        let required: RequiredEntitySet = ["浅草寺", "东京塔"].into_iter().collect();
        let itinerary = vec![day(&["浅草寺与仲见世商店街", "东京塔夜景"])];
        assert!(missing_entities(&itinerary, &required).is_empty());
    }

    #[test]
    fn test_missing_keeps_required_order() {
        let required: RequiredEntitySet = ["东京塔", "明治神宫", "浅草寺"].into_iter().collect();
        let itinerary = vec![day(&["明治神宫"]), day(&["上野公园"])];
        assert_eq!(missing_entities(&itinerary, &required), vec!["东京塔", "浅草寺"]);
    }

    #[test]
    fn test_latin_match_ignores_case() {
        let required: RequiredEntitySet = ["Hyde Park"].into_iter().collect();
        let itinerary = vec![day(&["Morning walk in hyde park"])];
        assert!(missing_entities(&itinerary, &required).is_empty());
    }

    #[test]
    fn test_landmark_alias_counts_as_covered() {
        let required: RequiredEntitySet = ["大本钟", "Eiffel Tower"].into_iter().collect();
        let itinerary = vec![day(&["Big Ben and Westminster", "埃菲尔铁塔登顶"])];
        assert!(missing_entities(&itinerary, &required).is_empty());

        let elsewhere = vec![day(&["Tower Bridge"])];
        assert_eq!(
            missing_entities(&elsewhere, &required),
            vec!["大本钟", "Eiffel Tower"]
        );
    }

    #[test]
    fn test_warning_is_appended() {
        let missing = vec!["东京塔".to_string(), "浅草寺".to_string()];
        let text = append_warning("记得带伞", &missing);
        assert!(text.starts_with("记得带伞\n\n"));
        assert!(text.contains("东京塔、浅草寺"));
        assert_eq!(append_warning("  ", &missing), coverage_warning(&missing));
    }
}
