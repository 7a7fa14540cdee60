use chrono::Utc;
use guitartab_common::user::Preferences;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::models::DbPreferences;

/// Stored preferences, or `None` if the user never saved any
pub async fn find(pool: &SqlitePool, user_id: Uuid) -> Result<Option<Preferences>, sqlx::Error> {
    let row = sqlx::query_as::<_, DbPreferences>("SELECT * FROM user_preferences WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Preferences::from))
}

/// Insert or replace the whole preferences row
pub async fn upsert(pool: &SqlitePool, user_id: Uuid, prefs: &Preferences) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO user_preferences (
            user_id, chord_color, lyric_color, background_color, title_color,
            font_size, font_family, auto_scroll_speed, auto_scroll_enabled,
            metronome_enabled, metronome_volume, metronome_tempo, display_mode,
            show_capo, show_key, show_tempo, show_difficulty,
            metronome_settings, display_settings, keyboard_shortcuts,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            chord_color = excluded.chord_color,
            lyric_color = excluded.lyric_color,
            background_color = excluded.background_color,
            title_color = excluded.title_color,
            font_size = excluded.font_size,
            font_family = excluded.font_family,
            auto_scroll_speed = excluded.auto_scroll_speed,
            auto_scroll_enabled = excluded.auto_scroll_enabled,
            metronome_enabled = excluded.metronome_enabled,
            metronome_volume = excluded.metronome_volume,
            metronome_tempo = excluded.metronome_tempo,
            display_mode = excluded.display_mode,
            show_capo = excluded.show_capo,
            show_key = excluded.show_key,
            show_tempo = excluded.show_tempo,
            show_difficulty = excluded.show_difficulty,
            metronome_settings = excluded.metronome_settings,
            display_settings = excluded.display_settings,
            keyboard_shortcuts = excluded.keyboard_shortcuts,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(&prefs.chord_color)
    .bind(&prefs.lyric_color)
    .bind(&prefs.background_color)
    .bind(&prefs.title_color)
    .bind(prefs.font_size)
    .bind(&prefs.font_family)
    .bind(prefs.auto_scroll_speed)
    .bind(prefs.auto_scroll_enabled)
    .bind(prefs.metronome_enabled)
    .bind(prefs.metronome_volume)
    .bind(prefs.metronome_tempo)
    .bind(prefs.display_mode.as_str())
    .bind(prefs.show_capo)
    .bind(prefs.show_key)
    .bind(prefs.show_tempo)
    .bind(prefs.show_difficulty)
    .bind(prefs.metronome_settings.to_string())
    .bind(prefs.display_settings.to_string())
    .bind(prefs.keyboard_shortcuts.to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}
