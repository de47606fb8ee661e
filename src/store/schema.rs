pub const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS issues (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id INTEGER NOT NULL UNIQUE,
    title TEXT NOT NULL,
    description TEXT,
    severity TEXT NOT NULL,
    status TEXT NOT NULL,
    company_id INTEGER NOT NULL,
    materiality INTEGER NOT NULL CHECK (materiality BETWEEN 0 AND 100),
    requirements TEXT NOT NULL DEFAULT '[]',
    considerations TEXT NOT NULL DEFAULT '[]',
    category TEXT NOT NULL,
    badge TEXT,
    hit TEXT,
    state TEXT NOT NULL DEFAULT 'open'
);

CREATE INDEX IF NOT EXISTS idx_issues_category ON issues(category);
CREATE INDEX IF NOT EXISTS idx_issues_company ON issues(company_id);
CREATE INDEX IF NOT EXISTS idx_issues_state ON issues(state);

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value INTEGER NOT NULL
);
";
