use crate::builtin::BuiltinCommand;
use crate::command::{Rejected, Reply};
use crate::env::Environment;
use crate::store::Totals;
use argh::FromArgs;

#[derive(FromArgs)]
/// Income and expenditure over the most recent ledger entries.
pub struct ShowFinance {
    #[argh(positional)]
    /// how many of the latest entries to sum; all of them when omitted.
    pub count: Option<usize>,
}

impl BuiltinCommand for ShowFinance {
    fn name() -> &'static str {
        "show"
    }

    fn subcommand() -> Option<&'static str> {
        Some("finance")
    }

    fn execute(self, env: &mut Environment) -> Result<Reply, Rejected> {
        env.require_admin()?;
        let ledger = env.store().ledger();
        let count = self.count.unwrap_or(ledger.len());
        let entries = env
            .store()
            .recent(count)
            .ok_or(Rejected::Precondition("not that many ledger entries"))?;
        if entries.is_empty() {
            return Ok("\n".to_string());
        }
        let totals = Totals::over(entries).ok_or(Rejected::Precondition("totals out of range"))?;
        Ok(format!("+ {} - {}\n", totals.income, totals.expenditure))
    }
}

#[derive(FromArgs)]
/// Totals over the whole ledger.
pub struct ReportFinance {}

impl BuiltinCommand for ReportFinance {
    fn name() -> &'static str {
        "report"
    }

    fn subcommand() -> Option<&'static str> {
        Some("finance")
    }

    fn execute(self, env: &mut Environment) -> Result<Reply, Rejected> {
        env.require_admin()?;
        let totals = env.store().totals();
        let profit = totals
            .profit()
            .ok_or(Rejected::Precondition("profit out of range"))?;
        Ok(format!(
            "=== Financial Report ===\n\
             Total Income: {}\n\
             Total Expenditure: {}\n\
             Net Profit: {}\n",
            totals.income,
            totals.expenditure,
            profit
        ))
    }
}

#[derive(FromArgs)]
/// Who is logged in, outermost session first.
pub struct ReportEmployee {}

impl BuiltinCommand for ReportEmployee {
    fn name() -> &'static str {
        "report"
    }

    fn subcommand() -> Option<&'static str> {
        Some("employee")
    }

    fn execute(self, env: &mut Environment) -> Result<Reply, Rejected> {
        env.require_admin()?;
        let sessions = env.sessions();
        let mut reply = format!(
            "=== Employee Work Report ===\nCurrently logged in users: {}\n",
            sessions.depth()
        );
        for user in sessions.iter().filter_map(|id| env.store().user(id)) {
            reply.push_str(&format!(
                "- {} ({}) - Privilege: {}\n",
                user.id, user.name, user.privilege
            ));
        }
        Ok(reply)
    }
}

#[derive(FromArgs)]
/// Record counts.
pub struct Log {}

impl BuiltinCommand for Log {
    fn name() -> &'static str {
        "log"
    }

    fn execute(self, env: &mut Environment) -> Result<Reply, Rejected> {
        env.require_admin()?;
        let store = env.store();
        Ok(format!(
            "=== System Log ===\n\
             Total users: {}\n\
             Total books: {}\n\
             Total transactions: {}\n",
            store.user_count(),
            store.book_count(),
            store.ledger().len()
        ))
    }
}
