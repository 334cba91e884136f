//! Prompt assembly for every call class the engine issues.
//!
//! Each builder opens with a fixed header line so logs (and mock
//! drivers in tests) can tell the call classes apart.

use feuilleton_core::{Item, Work};

/// Header of body generation prompts.
pub const BODY_HEADER: &str = "## WRITE ITEM BODY";
/// Header of rolling summary refresh prompts.
pub const SUMMARY_HEADER: &str = "## REFRESH ROLLING SUMMARY";
/// Header of resume seed prompts.
pub const SEED_HEADER: &str = "## SEED ROLLING SUMMARY";
/// Header of event classification prompts.
pub const CLASSIFY_HEADER: &str = "## CLASSIFY ITEM EVENTS";
/// Header of pacing scoring prompts.
pub const PACING_HEADER: &str = "## SCORE ITEM PACING";

/// Hand-off framing for the first item of a new partition.
#[derive(Debug, Clone)]
pub struct PartitionHandoff {
    /// Title of the partition being entered
    pub partition_title: String,
    /// Tail of the previous partition's final item body
    pub previous_tail: String,
}

/// Assemble the body generation prompt for one item.
#[allow(clippy::too_many_arguments)]
pub fn body_prompt(
    work: &Work,
    item: &Item,
    summary: &str,
    roster: &str,
    exclusion: Option<&str>,
    pacing_hint: Option<&str>,
    handoff: Option<&PartitionHandoff>,
) -> String {
    let mut prompt = format!(
        "{BODY_HEADER}\n\
         Work: {}\n\
         Item {}: {}\n\n",
        work.title, item.ordinal, item.title
    );

    if !summary.is_empty() {
        prompt.push_str("### STORY SO FAR\n");
        prompt.push_str(summary);
        prompt.push_str("\n\n");
    }

    if let Some(handoff) = handoff {
        prompt.push_str(&format!(
            "### NEW PARTITION\n\
             This item opens a new partition: {}. Pick up directly from \
             where the previous partition ended:\n{}\n\n",
            handoff.partition_title, handoff.previous_tail
        ));
    }

    if !roster.is_empty() {
        prompt.push_str("### ACTIVE CHARACTERS\n");
        prompt.push_str(roster);
        prompt.push_str("\n\n");
    }

    if let Some(exclusion) = exclusion {
        prompt.push_str("### HARD CONSTRAINTS\n");
        prompt.push_str(exclusion);
        prompt.push_str("\n\n");
    }

    if let Some(hint) = pacing_hint {
        prompt.push_str("### PACING\n");
        prompt.push_str(hint);
        prompt.push_str("\n\n");
    }

    prompt.push_str("### OUTLINE\n");
    prompt.push_str(item.outline.trim());
    prompt.push_str(
        "\n\nWrite the full body text for this item, following the outline \
         and every hard constraint. Output only the body text.",
    );
    prompt
}

/// Assemble the structured rolling summary refresh prompt.
///
/// The summary is the only channel carrying long-range state into
/// future calls, so the prompt demands a stable structure: main-plot
/// progress, ordered turning points, entity status changes with
/// explicit terminal markers, open threads.
pub fn summary_prompt(
    existing_summary: &str,
    recent: &str,
    entity_status: &str,
    trigger: &str,
) -> String {
    format!(
        "{SUMMARY_HEADER}\n\
         Trigger: {trigger}\n\n\
         ### CURRENT SUMMARY\n{existing}\n\n\
         ### NEW MATERIAL\n{recent}\n\n\
         ### ENTITY STATUS\n{entity_status}\n\n\
         Rewrite the summary from scratch, replacing the current one. \
         Keep it under 1200 words and use exactly these sections:\n\
         1. MAIN PLOT PROGRESS\n\
         2. MAJOR TURNING POINTS (ordered list)\n\
         3. ENTITY STATUS CHANGES (mark deaths as [DECEASED in <item>])\n\
         4. OPEN THREADS\n\
         Output only the summary.",
        existing = if existing_summary.is_empty() {
            "(none yet)"
        } else {
            existing_summary
        },
    )
}

/// Assemble the resume seed prompt from the tail of prior items.
pub fn seed_prompt(tail: &str) -> String {
    format!(
        "{SEED_HEADER}\n\
         The run is resuming mid-work. Summarize the following recent \
         items into the structured summary format (MAIN PLOT PROGRESS / \
         MAJOR TURNING POINTS / ENTITY STATUS CHANGES / OPEN THREADS). \
         Output only the summary.\n\n{tail}"
    )
}

/// Assemble the event classification prompt for one item body.
pub fn classification_prompt(text: &str) -> String {
    // Body tail is enough to classify; full bodies can exceed the
    // auxiliary call budget
    let excerpt: String = text.chars().take(2000).collect();
    format!(
        "{CLASSIFY_HEADER}\n\
         Does the following item contain any of these events? Answer with \
         only a JSON object: {{\"death\": bool, \"power_shift\": bool, \
         \"plot_turn\": bool, \"new_arc\": bool}}.\n\n{excerpt}"
    )
}

/// Assemble the pacing scoring prompt for one item body.
pub fn pacing_prompt(text: &str) -> String {
    let excerpt: String = text.chars().take(2000).collect();
    format!(
        "{PACING_HEADER}\n\
         Score the emotional register of the following item. Answer with \
         only a JSON object: {{\"emotion\": string, \"intensity\": 0-10, \
         \"tension\": 0-10, \"hope\": -10..10}}.\n\n{excerpt}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use feuilleton_core::Work;

    #[test]
    fn body_prompt_includes_constraints_verbatim() {
        let work = Work {
            id: "w".into(),
            title: "废土纪事".into(),
            synopsis: None,
        };
        let item = Item {
            id: "i1".into(),
            partition_id: "p1".into(),
            partition_ordinal: Some(1),
            ordinal: 4,
            title: "夜探".into(),
            outline: "沈柯夜探古庙。".into(),
            content: String::new(),
            word_count: 0,
        };
        let exclusion = "- 老猎人 is DEAD (died in i3).";
        let prompt = body_prompt(&work, &item, "summary", "- 沈柯", Some(exclusion), None, None);
        assert!(prompt.starts_with(BODY_HEADER));
        assert!(prompt.contains(exclusion));
        assert!(prompt.contains("沈柯夜探古庙。"));
    }

    #[test]
    fn headers_are_distinct() {
        let headers = [
            BODY_HEADER,
            SUMMARY_HEADER,
            SEED_HEADER,
            CLASSIFY_HEADER,
            PACING_HEADER,
        ];
        for (i, a) in headers.iter().enumerate() {
            for b in headers.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
