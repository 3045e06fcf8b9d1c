//! Database schema definitions for PipeQuest.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- Singleton gamification stats row
CREATE TABLE IF NOT EXISTS user_stats (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    current_xp INTEGER NOT NULL DEFAULT 0,
    current_level INTEGER NOT NULL DEFAULT 1,
    current_outreach_streak_days INTEGER NOT NULL DEFAULT 0,
    longest_outreach_streak_days INTEGER NOT NULL DEFAULT 0,
    last_outreach_date TEXT,
    last_consistency_score INTEGER,
    last_consistency_calculated_at TEXT,
    created_at TEXT NOT NULL
);

-- Append-only XP ledger; bonus_key enforces one-time grants
CREATE TABLE IF NOT EXISTS xp_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    amount INTEGER NOT NULL,
    reason TEXT NOT NULL,
    bonus_key TEXT UNIQUE,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_xp_logs_created_at ON xp_logs(created_at);

-- Singleton token balance (denormalized cache of the transaction sum)
CREATE TABLE IF NOT EXISTS user_tokens (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    total_tokens INTEGER NOT NULL DEFAULT 0
);

-- Append-only token ledger; negative amounts are spends
CREATE TABLE IF NOT EXISTS token_transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    amount INTEGER NOT NULL,
    reason TEXT NOT NULL,
    bonus_key TEXT UNIQUE,
    created_at TEXT NOT NULL
);

-- One goal row per (goal_type, period)
CREATE TABLE IF NOT EXISTS goals (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    goal_type TEXT NOT NULL,
    period TEXT NOT NULL,
    target_value INTEGER NOT NULL DEFAULT 0,
    is_manual INTEGER NOT NULL DEFAULT 0,
    UNIQUE(goal_type, period)
);

-- Static achievement catalog, unlocked monotonically
CREATE TABLE IF NOT EXISTS achievements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    key TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    unlocked_at TEXT
);

-- Repeating reward every N levels while active
CREATE TABLE IF NOT EXISTS level_rewards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    level_interval INTEGER NOT NULL UNIQUE,
    reward_text TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
);

-- One-time reward at a target level
CREATE TABLE IF NOT EXISTS milestone_rewards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    target_level INTEGER NOT NULL UNIQUE,
    reward_text TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    unlocked_at TEXT,
    claimed_at TEXT
);

-- One-time reward at a lifetime-revenue threshold
CREATE TABLE IF NOT EXISTS revenue_rewards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    target_revenue REAL NOT NULL UNIQUE,
    reward_text TEXT NOT NULL,
    reward_icon TEXT NOT NULL DEFAULT 'gift',
    is_active INTEGER NOT NULL DEFAULT 1,
    unlocked_at TEXT,
    claimed_at TEXT
);

-- Log of reward-unlock events; the unique triple prevents duplicate unlocks
CREATE TABLE IF NOT EXISTS unlocked_rewards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    reward_type TEXT NOT NULL,
    reward_reference_id INTEGER NOT NULL,
    level_achieved INTEGER NOT NULL,
    reward_text TEXT NOT NULL,
    unlocked_at TEXT NOT NULL,
    claimed_at TEXT,
    UNIQUE(reward_type, reward_reference_id, level_achieved)
);

-- Redeemable token-shop items
CREATE TABLE IF NOT EXISTS reward_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    cost INTEGER NOT NULL,
    description TEXT,
    is_active INTEGER NOT NULL DEFAULT 1
);

-- One mission row per weekday
CREATE TABLE IF NOT EXISTS daily_missions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    mission_date TEXT NOT NULL UNIQUE,
    mission_type TEXT NOT NULL,
    description TEXT NOT NULL,
    target_count INTEGER NOT NULL,
    progress_count INTEGER NOT NULL DEFAULT 0,
    reward_tokens INTEGER NOT NULL,
    is_completed INTEGER NOT NULL DEFAULT 0
);

-- One boss fight row per calendar month
CREATE TABLE IF NOT EXISTS boss_fights (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    month TEXT NOT NULL UNIQUE,
    boss_type TEXT NOT NULL,
    description TEXT NOT NULL,
    target_value INTEGER NOT NULL,
    progress_value INTEGER NOT NULL DEFAULT 0,
    reward_tokens INTEGER NOT NULL,
    is_completed INTEGER NOT NULL DEFAULT 0
);

-- Singleton settings row (pause mode)
CREATE TABLE IF NOT EXISTS user_settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    pause_active INTEGER NOT NULL DEFAULT 0,
    pause_start TEXT,
    pause_end TEXT,
    pause_reason TEXT
);

-- Append-only activity feed
CREATE TABLE IF NOT EXISTS activity_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    action_type TEXT NOT NULL,
    description TEXT NOT NULL,
    related_id INTEGER,
    related_kind TEXT,
    timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_activity_log_timestamp ON activity_log(timestamp);

-- Cached monthly report snapshots
CREATE TABLE IF NOT EXISTS monthly_reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    year_month TEXT NOT NULL UNIQUE,
    content TEXT NOT NULL,
    generated_at TEXT NOT NULL
);

-- Leads pipeline
CREATE TABLE IF NOT EXISTS leads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    business_name TEXT,
    niche TEXT,
    email TEXT,
    phone TEXT,
    source TEXT,
    status TEXT NOT NULL DEFAULT 'new',
    notes TEXT,
    has_website INTEGER NOT NULL DEFAULT 0,
    website_quality TEXT,
    next_action_date TEXT,
    last_contacted_at TEXT,
    converted_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_leads_status ON leads(status);

-- Clients with one-off and recurring revenue
CREATE TABLE IF NOT EXISTS clients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    business_name TEXT,
    contact_email TEXT,
    project_type TEXT NOT NULL DEFAULT 'website',
    start_date TEXT,
    amount_charged REAL NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'active',
    hosting_active INTEGER NOT NULL DEFAULT 0,
    monthly_hosting_fee REAL NOT NULL DEFAULT 0,
    saas_active INTEGER NOT NULL DEFAULT 0,
    monthly_saas_fee REAL NOT NULL DEFAULT 0,
    related_lead_id INTEGER REFERENCES leads(id),
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Tasks
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    due_date TEXT,
    status TEXT NOT NULL DEFAULT 'open',
    related_lead_id INTEGER REFERENCES leads(id),
    related_client_id INTEGER REFERENCES clients(id),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(due_date);

-- Outreach activity log
CREATE TABLE IF NOT EXISTS outreach_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    type TEXT NOT NULL DEFAULT 'email',
    outcome TEXT NOT NULL DEFAULT 'contacted',
    lead_id INTEGER REFERENCES leads(id),
    notes TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_outreach_logs_date ON outreach_logs(date);

-- Freelance income outside the client pipeline
CREATE TABLE IF NOT EXISTS freelance_jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT 'other',
    amount REAL NOT NULL DEFAULT 0,
    date_completed TEXT,
    created_at TEXT NOT NULL
);
"#;

/// SQL for schema version tracking (migrations)
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version
pub const CURRENT_VERSION: i32 = 1;
