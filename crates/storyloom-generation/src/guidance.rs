//! Chapter-position guidance and prompt assembly.

use crate::generator::ChapterRequest;

/// Style direction prepended to every illustration prompt.
pub const ILLUSTRATION_STYLE: &str = "Create an anime-style splash screen in a 16:9 aspect ratio. \
The image should feature vibrant colors, dynamic poses, and a mystical atmosphere, with an \
emphasis on detailed character designs and magical elements. Include elegant text overlays for \
chapter titles in a glowing, stylized font. The prompt is as follows:";

/// Where a chapter sits in the arc of its story.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterPhase {
    /// Progress below 0.25.
    Establish,
    /// Progress in `[0.25, 0.75)`.
    Develop,
    /// Progress of 0.75 and above.
    Resolve,
}

impl ChapterPhase {
    /// Phase for `chapter_number` of `total_chapters`, by
    /// `progress = chapter_number / total_chapters`.
    #[must_use]
    pub fn for_chapter(chapter_number: u32, total_chapters: u32) -> Self {
        if total_chapters == 0 {
            return Self::Resolve;
        }
        let progress = f64::from(chapter_number) / f64::from(total_chapters);
        if progress < 0.25 {
            Self::Establish
        } else if progress < 0.75 {
            Self::Develop
        } else {
            Self::Resolve
        }
    }

    /// Tone guidance for this phase.
    #[must_use]
    pub fn guidance(self) -> &'static str {
        match self {
            Self::Establish => {
                "This is an early chapter. Focus on introducing key characters and establishing \
                 the world. Create intrigue and set up future conflicts."
            }
            Self::Develop => {
                "This is a middle chapter. Develop existing conflicts, reveal character \
                 motivations, and increase tension. Avoid introducing too many new elements."
            }
            Self::Resolve => {
                "This is among the final chapters. Work toward resolving major conflicts while \
                 maintaining tension. Ensure continuity with earlier chapters and prepare for a \
                 satisfying conclusion."
            }
        }
    }
}

/// Builds the full chapter prompt.
#[must_use]
pub fn chapter_prompt(request: &ChapterRequest) -> String {
    let number = request.chapter_number;
    let total = request.total_chapters;
    let guidance = ChapterPhase::for_chapter(number, total).guidance();

    let hint = request.audience_hint.trim();
    let audience = if hint.is_empty() {
        String::new()
    } else {
        format!(
            "\nAUDIENCE SUGGESTION:\nReaders voted for this direction. Weave it into the chapter \
             where it fits the story:\n\"{hint}\"\n"
        )
    };

    format!(
        "You are writing Chapter {number} of {total} of an original fantasy novel.

STORY CONTEXT:
{context}

CHAPTER GUIDANCE:
{guidance}
{audience}
WRITING INSTRUCTIONS:
1. Maintain consistent character voices and motivations.
2. Balance dialogue, action, and description.
3. Build upon previous events in logical ways.
4. Include at least one meaningful character development or plot advancement.
5. End with a hook that leads naturally to the next chapter.
6. Keep the tone consistent with the existing story.
7. BE ORIGINAL - avoid common fantasy tropes and predictable outcomes.
8. DO NOT summarize the story or repeat information - continue the narrative.

FORMAT:
- Write in third person past tense.
- Title this chapter appropriately.
- Write approximately 1000-1500 words.
- DO NOT include \"Chapter {number}\" in your response.
- DO NOT end with \"To be continued\" or similar phrases.

Begin Chapter {number}:",
        context = request.context,
    )
}

/// Builds the illustration prompt for a chapter's text.
#[must_use]
pub fn illustration_prompt(chapter_text: &str) -> String {
    format!("{ILLUSTRATION_STYLE}\n\n{chapter_text}")
}
