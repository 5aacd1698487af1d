// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

/// Return the keywords that occur in `text`, ignoring case.
///
/// Plain substring search over the whole text: "sale" matches "wholesale".
/// Keywords are trimmed, blank ones skipped, and each keyword is reported at
/// most once in the order given.
pub fn match_keywords(text: &str, keywords: &[String]) -> Vec<String> {
    let haystack = text.to_lowercase();
    let mut found: Vec<String> = Vec::new();

    for keyword in keywords {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            continue;
        }
        let needle = keyword.to_lowercase();
        if haystack.contains(&needle) && !found.iter().any(|f| f.to_lowercase() == needle) {
            found.push(keyword.to_string());
        }
    }

    found
}
