use std::path::Path;

use rusqlite::{Connection, params_from_iter};

/// Category columns of the fixture table.
pub const CATEGORIES: [&str; 3] = ["related", "water", "medical_help"];

/// Ten short messages with `related`, `water` and `medical_help` flags.
pub const MESSAGES: [(&str, [i64; 3]); 10] = [
    ("We need clean drinking water in the village", [1, 1, 0]),
    ("No water since the flood, please send water", [1, 1, 0]),
    ("Water tanks are empty and people are thirsty", [1, 1, 0]),
    ("Injured people need a doctor urgently", [1, 0, 1]),
    ("Send medical help, many children are hurt", [1, 0, 1]),
    ("The clinic has no medicine for the injured", [1, 0, 1]),
    ("We need water and a doctor for the wounded", [1, 1, 1]),
    ("Thanks for the weather update", [0, 0, 0]),
    ("What time is the football match tonight", [0, 0, 0]),
    ("Roads are blocked near the bridge", [2, 0, 0]),
];

/// Write the fixture corpus to a new SQLite file at `path`.
pub fn seed_corpus(path: &Path) {
    seed_rows(path, &MESSAGES);
}

pub fn seed_rows(path: &Path, rows: &[(&str, [i64; 3])]) {
    let conn = Connection::open(path).expect("open fixture db");
    conn.execute_batch(
        "CREATE TABLE messages (
            id INTEGER PRIMARY KEY,
            message TEXT,
            original TEXT,
            genre TEXT,
            related INTEGER,
            water INTEGER,
            medical_help INTEGER
        );",
    )
    .expect("create messages table");
    for (idx, (message, flags)) in rows.iter().enumerate() {
        let values: Vec<rusqlite::types::Value> = vec![
            (idx as i64 + 1).into(),
            message.to_string().into(),
            rusqlite::types::Value::Null,
            "direct".to_string().into(),
            flags[0].into(),
            flags[1].into(),
            flags[2].into(),
        ];
        conn.execute(
            "INSERT INTO messages VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params_from_iter(values),
        )
        .expect("insert fixture row");
    }
}
