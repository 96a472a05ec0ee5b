//! Prompt construction. The output depends on the profile alone.

use super::{ListeningProfile, Playlist};

/// Tracks quoted per playlist before the summary is elided.
pub const PLAYLIST_PREVIEW_TRACKS: usize = 5;
pub const RECOMMENDATION_COUNT: usize = 5;
pub const MAX_TEXT_CHARS: usize = 150;

pub const SYSTEM_PROMPT: &str =
    "You are a witty music critic. You always answer with a single JSON object and nothing else.";

const OUTPUT_SCHEMA: &str = r#"{
  "tracks": {
    "nice": { "emoji": "🎧", "text": "..." },
    "funny": { "emoji": "🤣", "text": "..." },
    "roast": { "emoji": "🔥", "text": "..." }
  },
  "artists": {
    "nice": { "emoji": "🌟", "text": "..." },
    "funny": { "emoji": "😂", "text": "..." },
    "roast": { "emoji": "💀", "text": "..." }
  },
  "playlists": {
    "nice": { "emoji": "📚", "text": "..." },
    "funny": { "emoji": "🎢", "text": "..." },
    "roast": { "emoji": "💣", "text": "..." }
  },
  "recommendations": [
    { "name": "...", "artist": "...", "genre": "..." }
  ]
}"#;

/// One line per playlist: `name: t1 by a1, t2 by a2...`.
pub fn playlist_summary(playlist: &Playlist) -> String {
    let preview: Vec<String> = playlist
        .tracks
        .iter()
        .take(PLAYLIST_PREVIEW_TRACKS)
        .map(|t| format!("{} by {}", t.name, t.artist))
        .collect();
    let more = if playlist.tracks.len() > PLAYLIST_PREVIEW_TRACKS {
        "..."
    } else {
        ""
    };
    format!("{}: {}{}", playlist.name, preview.join(", "), more)
}

pub fn build_prompt(profile: &ListeningProfile) -> String {
    let track_names = profile
        .tracks
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let artist_names = profile
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let playlist_lines = profile
        .playlists
        .iter()
        .map(|p| format!("   - {}", playlist_summary(p)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze this user's Spotify listening in three categories, each with three tones.

1. Top tracks ({track_names}):
   - nice: a complimentary analysis
   - funny: a humorous observation
   - roast: a savage but lighthearted critique

2. Top artists ({artist_names}):
   - nice: a positive interpretation
   - funny: an amusing perspective
   - roast: playful mockery

3. Playlist contents:
{playlist_lines}
   - nice: insight about curation patterns
   - funny: a witty take on how the playlists are organized
   - roast: a savage observation about the collection's themes

Guidelines:
- For playlists, focus on the actual tracks, not just the titles
- Point out patterns like genre mix, era consistency and mood swings
- Keep the roast funny, never mean-spirited
- Pick emojis that match each tone

Recommendations:
- Suggest {RECOMMENDATION_COUNT} songs by artists NOT in the listening data above
- Spread them across genres that fit the user's taste
- Give the song name, the artist and a genre for each
- The recommended artists must differ from: {artist_names}

Respond with exactly this JSON structure:
{OUTPUT_SCHEMA}

Formatting rules:
1. Output only valid JSON, never markdown or code fences
2. No comments and no trailing commas
3. Keep every text value under {MAX_TEXT_CHARS} characters
4. Use regular double quotes only, never smart quotes
5. Escape any quote inside a value as \\\"
"
    )
}
