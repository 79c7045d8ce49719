//! Initial database migration.
//!
//! Creates the enum types, collaborator tables, the balance ledger table
//! with its idempotency indexes, and the append-only triggers.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: COLLABORATOR TABLES
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(PROJECTS_SQL).await?;
        db.execute_unprepared(CONTRIBUTIONS_SQL).await?;
        db.execute_unprepared(PAYMENTS_SQL).await?;

        // ============================================================
        // PART 3: BALANCE LEDGER
        // ============================================================
        db.execute_unprepared(BALANCE_TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 4: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Owner account classification
CREATE TYPE account_type AS ENUM ('natural_person', 'legal_entity');

-- Project lifecycle states
CREATE TYPE project_state AS ENUM (
    'draft',
    'online',
    'waiting_funds',
    'successful',
    'failed'
);

-- Contribution lifecycle states
CREATE TYPE contribution_state AS ENUM ('pending', 'confirmed', 'canceled');

-- Payment lifecycle states
CREATE TYPE payment_state AS ENUM ('pending', 'paid', 'refunded', 'chargeback');

-- Balance ledger event kinds (closed set; the store rejects anything else)
CREATE TYPE balance_event AS ENUM (
    'successful_project_pledged',
    'catarse_project_service_fee',
    'irrf_tax_project',
    'project_contribution_confirmed_after_finished',
    'catarse_contribution_fee',
    'contribution_chargedback',
    'contribution_refund',
    'balance_expired',
    'balance_transfer_request',
    'balance_transfer_project'
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL UNIQUE,
    account_type account_type NOT NULL DEFAULT 'natural_person',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const PROJECTS_SQL: &str = r"
CREATE TABLE projects (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id),
    name VARCHAR(255) NOT NULL,
    goal NUMERIC(14, 2) NOT NULL,
    service_fee NUMERIC(5, 4) NOT NULL DEFAULT 0.13,
    irrf_tax NUMERIC(14, 2) NOT NULL DEFAULT 0,
    paid_pledged NUMERIC(14, 2) NOT NULL DEFAULT 0,
    state project_state NOT NULL DEFAULT 'draft',
    expires_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_goal_positive CHECK (goal > 0),
    CONSTRAINT chk_service_fee_rate CHECK (service_fee >= 0 AND service_fee < 1)
);

CREATE INDEX idx_projects_user ON projects(user_id);
CREATE INDEX idx_projects_state ON projects(state);
";

const CONTRIBUTIONS_SQL: &str = r"
CREATE TABLE contributions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    project_id UUID NOT NULL REFERENCES projects(id),
    user_id UUID NOT NULL REFERENCES users(id),
    value NUMERIC(14, 2) NOT NULL,
    state contribution_state NOT NULL DEFAULT 'pending',
    balance_refunded BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_value_positive CHECK (value > 0)
);

CREATE INDEX idx_contributions_project ON contributions(project_id);
CREATE INDEX idx_contributions_user ON contributions(user_id);
";

const PAYMENTS_SQL: &str = r"
CREATE TABLE payments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    contribution_id UUID NOT NULL REFERENCES contributions(id),
    value NUMERIC(14, 2) NOT NULL,
    state payment_state NOT NULL DEFAULT 'pending',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_payments_contribution ON payments(contribution_id);
CREATE INDEX idx_payments_state ON payments(state);
";

const BALANCE_TRANSACTIONS_SQL: &str = r"
CREATE TABLE balance_transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    project_id UUID REFERENCES projects(id),
    contribution_id UUID REFERENCES contributions(id),
    user_id UUID NOT NULL REFERENCES users(id),
    event balance_event NOT NULL,
    amount NUMERIC(14, 2) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_amount_nonzero CHECK (amount <> 0)
);

-- Idempotency backstop: at-most-once events per subject. Concurrent callers
-- racing past the guard lookup fail here and the operation no-ops.
CREATE UNIQUE INDEX uq_bt_project_event
    ON balance_transactions(event, project_id)
    WHERE event IN (
        'successful_project_pledged',
        'catarse_project_service_fee',
        'irrf_tax_project'
    );

CREATE UNIQUE INDEX uq_bt_contribution_event
    ON balance_transactions(event, contribution_id)
    WHERE event IN (
        'project_contribution_confirmed_after_finished',
        'catarse_contribution_fee',
        'contribution_chargedback',
        'contribution_refund',
        'balance_expired'
    );

CREATE INDEX idx_bt_user_event ON balance_transactions(user_id, event);
CREATE INDEX idx_bt_project ON balance_transactions(project_id);
CREATE INDEX idx_bt_contribution ON balance_transactions(contribution_id);
CREATE INDEX idx_bt_event_created ON balance_transactions(event, created_at);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: set_updated_at
-- Keeps updated_at current on collaborator tables
-- ============================================================
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_users_updated_at
BEFORE UPDATE ON users
FOR EACH ROW
EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_projects_updated_at
BEFORE UPDATE ON projects
FOR EACH ROW
EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_contributions_updated_at
BEFORE UPDATE ON contributions
FOR EACH ROW
EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_payments_updated_at
BEFORE UPDATE ON payments
FOR EACH ROW
EXECUTE FUNCTION set_updated_at();

-- ============================================================
-- FUNCTION: prevent_balance_mutation
-- The ledger is append-only; corrections are offsetting entries
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_balance_mutation()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'balance_transactions are append-only. Post an offsetting entry instead.';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_balance_transactions_immutable
BEFORE UPDATE OR DELETE ON balance_transactions
FOR EACH ROW
EXECUTE FUNCTION prevent_balance_mutation();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS balance_transactions CASCADE;
DROP TABLE IF EXISTS payments CASCADE;
DROP TABLE IF EXISTS contributions CASCADE;
DROP TABLE IF EXISTS projects CASCADE;
DROP TABLE IF EXISTS users CASCADE;

DROP FUNCTION IF EXISTS set_updated_at CASCADE;
DROP FUNCTION IF EXISTS prevent_balance_mutation CASCADE;

DROP TYPE IF EXISTS balance_event;
DROP TYPE IF EXISTS payment_state;
DROP TYPE IF EXISTS contribution_state;
DROP TYPE IF EXISTS project_state;
DROP TYPE IF EXISTS account_type;
";
