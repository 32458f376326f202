//! Command handlers.

use anyhow::{Context, Result};
use prism_core::models::Registration;
use prism_core::{
    ApiError, ListFilter, PrismClient, Resource, ResourceClient, SessionEvent, SignOutReason,
    TransactionFilter, TransactionKind,
};
use serde::Serialize;

use crate::output::{self, Row};
use crate::{
    BudgetCommand, CategoryCommand, CollectionCommand, Commands, Format, GoalCommand, KindArg,
    ListArgs, RecordCommand, TransactionCommand, TransactionListArgs,
};

/// Tell the user when the session ends underneath a command.
pub fn watch_session(client: &PrismClient) {
    let mut events = client.session().subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let SessionEvent::SignedOut {
                reason: SignOutReason::RenewalFailed,
            } = event
            {
                eprintln!("Your session has expired. Run `prism login` to sign in again.");
            }
        }
    });
}

pub async fn run(client: &PrismClient, command: Commands, format: Format) -> Result<()> {
    let result = match command {
        Commands::Login { email, password } => login(client, &email, &password, format).await,
        Commands::Register {
            email,
            password,
            first_name,
            last_name,
        } => {
            let registration = Registration::new(email, password).name(first_name, last_name);
            let user = client.auth().register(&registration).await?;
            output::record(&user, format)
        }
        Commands::Logout => {
            client.auth().logout().await?;
            println!("Signed out");
            Ok(())
        }
        Commands::Whoami => {
            let user = client.users().profile().await?;
            output::record(&user, format)
        }
        Commands::Refresh => {
            client.auth().refresh().await?;
            println!("Access token renewed");
            Ok(())
        }
        Commands::Accounts(command) => collection(client.accounts(), command, format).await,
        Commands::Transactions(command) => transactions(client, command, format).await,
        Commands::Categories(command) => categories(client, command, format).await,
        Commands::Budgets(command) => budgets(client, command, format).await,
        Commands::Goals(command) => goals(client, command, format).await,
    };

    result.map_err(|e| match e.downcast::<ApiError>() {
        Ok(api) => anyhow::anyhow!(api.user_message()),
        Err(other) => other,
    })
}

async fn login(client: &PrismClient, email: &str, password: &str, format: Format) -> Result<()> {
    let user = client.auth().login(email, password).await?;
    if !client.session().is_authenticated() {
        anyhow::bail!("Login succeeded but no session was stored");
    }
    match format {
        Format::Json => output::record(&user, format),
        Format::Text => {
            println!("Signed in as {}", user.row());
            Ok(())
        }
    }
}

fn list_filter(args: &ListArgs) -> ListFilter {
    let mut filter = ListFilter::new();
    if let Some(search) = &args.search {
        filter = filter.search(search.as_str());
    }
    if let Some(ordering) = &args.ordering {
        filter = filter.ordering(ordering.as_str());
    }
    if let Some(page) = args.page {
        filter = filter.page(page);
    }
    filter
}

fn transaction_filter(args: &TransactionListArgs) -> TransactionFilter {
    let mut filter = TransactionFilter::new()
        .account(args.account)
        .category(args.category)
        .kind(args.kind.map(|k| match k {
            KindArg::Income => TransactionKind::Income,
            KindArg::Expense => TransactionKind::Expense,
        }))
        .start_date(args.from)
        .end_date(args.to)
        .page(args.list.page);
    if let Some(search) = &args.list.search {
        filter = filter.search(search.as_str());
    }
    if let Some(ordering) = &args.list.ordering {
        filter = filter.ordering(ordering.as_str());
    }
    filter
}

async fn collection<R>(
    client: &ResourceClient<R>,
    command: CollectionCommand,
    format: Format,
) -> Result<()>
where
    R: Resource<Filter = ListFilter>,
    R::Item: Row + Serialize,
{
    match command {
        CollectionCommand::List(args) => {
            let filter = list_filter(&args);
            if args.all {
                let items = client.list_all(&filter).await?;
                output::all(&items, format)
            } else {
                let page = client.list(&filter).await?;
                output::page(&page, format)
            }
        }
        CollectionCommand::Record(command) => record(client, command, format).await,
    }
}

async fn record<R>(
    client: &ResourceClient<R>,
    command: RecordCommand,
    format: Format,
) -> Result<()>
where
    R: Resource,
    R::Item: Row + Serialize,
{
    match command {
        RecordCommand::Get { id } => {
            let item = client
                .get(id)
                .await
                .with_context(|| format!("Failed to fetch #{}", id))?;
            output::record(&item, format)
        }
        RecordCommand::Summary => {
            let summary = client.summary().await?;
            output::record(&summary, format)
        }
        RecordCommand::Delete { id } => {
            client.delete(id).await?;
            println!("Deleted #{}", id);
            Ok(())
        }
    }
}

async fn transactions(
    client: &PrismClient,
    command: TransactionCommand,
    format: Format,
) -> Result<()> {
    let transactions = client.transactions();
    match command {
        TransactionCommand::List(args) => {
            let filter = transaction_filter(&args);
            if args.list.all {
                let items = transactions.list_all(&filter).await?;
                output::all(&items, format)
            } else {
                let page = transactions.list(&filter).await?;
                output::page(&page, format)
            }
        }
        TransactionCommand::Recent { limit } => {
            let page = transactions.recent(limit).await?;
            output::page(&page, format)
        }
        TransactionCommand::Record(command) => record(transactions, command, format).await,
    }
}

async fn categories(
    client: &PrismClient,
    command: CategoryCommand,
    format: Format,
) -> Result<()> {
    let categories = client.categories();
    match command {
        CategoryCommand::Tree => {
            let tree = categories.tree().await?;
            output::tree(&tree.results, format)
        }
        CategoryCommand::ByType => output::grouped(&categories.by_type().await?, format),
        CategoryCommand::Common(command) => collection(categories, command, format).await,
    }
}

async fn budgets(client: &PrismClient, command: BudgetCommand, format: Format) -> Result<()> {
    let budgets = client.budgets();
    match command {
        BudgetCommand::Current => output::page(&budgets.current().await?, format),
        BudgetCommand::OverBudget => output::page(&budgets.over_budget().await?, format),
        BudgetCommand::Common(command) => collection(budgets, command, format).await,
    }
}

async fn goals(client: &PrismClient, command: GoalCommand, format: Format) -> Result<()> {
    let goals = client.goals();
    match command {
        GoalCommand::Active => output::page(&goals.active().await?, format),
        GoalCommand::Completed => output::page(&goals.completed().await?, format),
        GoalCommand::NearTarget => output::page(&goals.near_target().await?, format),
        GoalCommand::Progress { id, amount } => {
            let goal = goals.update_progress(id, amount).await?;
            output::record(&goal, format)
        }
        GoalCommand::Common(command) => collection(goals, command, format).await,
    }
}
