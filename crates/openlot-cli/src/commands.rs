//! Subcommands and their output.

use crate::board::AuctionBoard;
use crate::present::{now_nanos, render_bid, render_item, render_proposal};
use clap::Subcommand;
use openlot_client::{
    CallerIdentity, CredentialStore, KeyValueStore, LocalCredentialStore, Services, Transport,
};
use openlot_core::auction::{AuctionItem, CreateAuctionItem, UpdateAuctionItem};
use openlot_core::voting::{Choice, CreateProposal};
use openlot_core::{CallResult, Envelope, Nat, Principal};
use serde::Serialize;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in with the local identity, creating it on first use
    Login,
    /// Log out, keeping the identity for next time unless --forget is given
    Logout {
        #[arg(long)]
        forget: bool,
    },
    /// Show the current principal
    Whoami,
    /// Auction listings
    #[command(subcommand)]
    Auction(AuctionCommand),
    /// Proposals and votes
    #[command(subcommand)]
    Proposal(ProposalCommand),
}

#[derive(Debug, Subcommand)]
pub enum AuctionCommand {
    /// List listings
    List {
        /// Only listings still open for bids
        #[arg(long)]
        active: bool,
        /// Only listings owned by this principal
        #[arg(long)]
        owner: Option<Principal>,
    },
    /// Show one listing
    Show { id: Nat },
    /// Show the bids on a listing
    Bids { id: Nat },
    /// Create a listing
    Create {
        title: String,
        description: String,
        #[arg(long)]
        price: Nat,
        /// Auction length in hours; no limit when omitted
        #[arg(long)]
        hours: Option<Nat>,
    },
    /// Bid on a listing
    Bid { id: Nat, amount: Nat },
    /// Change a listing you own
    Edit {
        id: Nat,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        price: Option<Nat>,
        #[arg(long)]
        hours: Option<Nat>,
    },
    /// Close a listing you own
    Stop { id: Nat },
    /// Close a listing if its time is up
    RefreshStatus { id: Nat },
    /// Counts and record holders
    Stats,
    /// Remove every listing
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum ProposalCommand {
    Show { id: Nat },
    Count,
    Create {
        id: Nat,
        description: String,
        /// Create the proposal closed for voting
        #[arg(long)]
        inactive: bool,
    },
    /// Vote approve, reject or pass
    Vote { id: Nat, choice: Choice },
    End { id: Nat },
}

/// How results are printed.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    /// Print `result`. Returns whether it was a success.
    fn report<T: Serialize>(
        self,
        action: &str,
        result: &CallResult<T>,
        render: impl FnOnce(&T),
    ) -> anyhow::Result<bool> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(&Envelope(result))?);
            return Ok(result.is_ok());
        }
        match result {
            Ok(data) => {
                render(data);
                Ok(true)
            }
            Err(kind) => {
                eprintln!("Failed to {action}: {kind}");
                Ok(false)
            }
        }
    }
}

/// The three stats results as one JSON document.
#[derive(Serialize)]
struct StatsReport<'a> {
    count: Envelope<'a, Nat>,
    sold_for_most: Envelope<'a, Option<AuctionItem>>,
    most_bid_on: Envelope<'a, Option<AuctionItem>>,
}

fn stats_json(
    count: &CallResult<Nat>,
    sold: &CallResult<Option<AuctionItem>>,
    popular: &CallResult<Option<AuctionItem>>,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&StatsReport {
        count: Envelope(count),
        sold_for_most: Envelope(sold),
        most_bid_on: Envelope(popular),
    })
}

/// The logged-in principal. An unreadable session counts as logged out.
fn viewer(credentials: &impl CredentialStore) -> Option<Principal> {
    match credentials.current_identity() {
        Ok(identity) => identity.map(|identity| identity.principal()),
        Err(e) => {
            tracing::warn!("Treating session as logged out: {}", e);
            None
        }
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

/// Run one command. Returns whether it succeeded.
pub async fn run<S, T>(
    command: Command,
    services: &Services<T>,
    credentials: &LocalCredentialStore<S>,
    output: Output,
) -> anyhow::Result<bool>
where
    S: KeyValueStore,
    T: Transport,
{
    match command {
        Command::Login => {
            let identity = credentials.get_or_create_identity().await?;
            println!("Logged in as {}", identity.principal());
            Ok(true)
        }
        Command::Logout { forget } => {
            if forget {
                credentials.forget()?;
            } else {
                credentials.clear_identity().await?;
            }
            println!("Logged out");
            Ok(true)
        }
        Command::Whoami => {
            let logged_in = viewer(credentials).is_some();
            let state = if logged_in { "logged in" } else { "anonymous" };
            println!("{} ({})", credentials.session_principal(), state);
            Ok(true)
        }
        Command::Auction(command) => {
            let viewer = viewer(credentials);
            auction(command, services, viewer.as_ref(), output).await
        }
        Command::Proposal(command) => proposal(command, services, output).await,
    }
}

async fn auction<T: Transport>(
    command: AuctionCommand,
    services: &Services<T>,
    viewer: Option<&Principal>,
    output: Output,
) -> anyhow::Result<bool> {
    let service = &services.auction;
    let now = now_nanos();
    let card = |item: &AuctionItem| print_lines(render_item(item, viewer, now));

    let changed = match command {
        AuctionCommand::List { active, owner } => {
            let result = match (&owner, active) {
                (Some(owner), _) => service.get_user_items(owner).await,
                (None, true) => service.get_active_auction_items().await,
                (None, false) => service.get_all_auction_items().await,
            };
            let result = result.map(|items| {
                items
                    .into_iter()
                    .filter(|item| !active || item.is_active)
                    .collect::<Vec<_>>()
            });
            return output.report("fetch auctions", &result, |items| {
                if items.is_empty() {
                    println!("No auctions");
                }
                for item in items {
                    card(item);
                }
            });
        }
        AuctionCommand::Show { id } => {
            let result = service.get_auction_item(&id).await;
            return output.report("fetch auction", &result, |item| match item {
                Some(item) => card(item),
                None => println!("No auction {id}"),
            });
        }
        AuctionCommand::Bids { id } => {
            let result = service.get_item_bids(&id).await;
            return output.report("fetch bids", &result, |bids| {
                if bids.is_empty() {
                    println!("No bids");
                }
                for bid in bids {
                    println!("{}", render_bid(bid));
                }
            });
        }
        AuctionCommand::Stats => {
            let count = service.get_auction_count().await;
            let sold = service.get_item_sold_for_most().await;
            let popular = service.get_most_bid_on_item().await;
            if output.json {
                println!("{}", stats_json(&count, &sold, &popular)?);
                return Ok(count.is_ok() && sold.is_ok() && popular.is_ok());
            }
            let mut ok = output.report("count auctions", &count, |count| {
                println!("Auctions: {count}");
            })?;
            ok &= output.report("fetch top sale", &sold, |item| {
                if let Some(item) = item {
                    println!("Sold for the most:");
                    card(item);
                }
            })?;
            ok &= output.report("fetch most bid on", &popular, |item| {
                if let Some(item) = item {
                    println!("Most bid on:");
                    card(item);
                }
            })?;
            return Ok(ok);
        }
        AuctionCommand::Create {
            title,
            description,
            price,
            hours,
        } => {
            let result = service
                .create_auction_item(&CreateAuctionItem {
                    title,
                    description,
                    starting_price: price,
                    duration_hours: hours,
                })
                .await;
            output.report("create auction", &result, |item| {
                println!("Created auction {}", item.id);
            })?
        }
        AuctionCommand::Bid { id, amount } => {
            let result = service.place_bid(&id, &amount).await;
            output.report("place bid", &result, |_| {
                println!("Bid of {amount} ICP placed on auction {id}");
            })?
        }
        AuctionCommand::Edit {
            id,
            title,
            description,
            price,
            hours,
        } => {
            let updates = UpdateAuctionItem {
                title,
                description,
                starting_price: price,
                duration_hours: hours,
            };
            let result = service.edit_auction_item(&id, &updates).await;
            output.report("edit auction", &result, |item| {
                println!("Updated auction {}", item.id);
            })?
        }
        AuctionCommand::Stop { id } => {
            let result = service.stop_auction(&id).await;
            output.report("stop auction", &result, |item| match &item.new_owner {
                Some(winner) => println!("Auction {} stopped, sold to {}", item.id, winner),
                None => println!("Auction {} stopped without bids", item.id),
            })?
        }
        AuctionCommand::RefreshStatus { id } => {
            let result = service.update_auction_status(&id).await;
            output.report("update auction status", &result, |item| {
                let state = if item.is_active { "still active" } else { "ended" };
                println!("Auction {} is {}", item.id, state);
            })?
        }
        AuctionCommand::Clear => {
            let result = service.clear_all_auctions().await;
            output.report("clear auctions", &result, |count| {
                println!("Removed {count} auctions");
            })?
        }
    };

    if changed {
        let mut board = AuctionBoard::new();
        if board.refresh(service).await.is_ok() && !output.json {
            println!();
            for item in board.items() {
                card(item);
            }
        }
    }
    Ok(changed)
}

async fn proposal<T: Transport>(
    command: ProposalCommand,
    services: &Services<T>,
    output: Output,
) -> anyhow::Result<bool> {
    let service = &services.voting;

    let (changed, id) = match command {
        ProposalCommand::Show { id } => {
            let result = service.get_proposal(&id).await;
            return output.report("fetch proposal", &result, |proposal| match proposal {
                Some(proposal) => print_lines(render_proposal(&id, proposal)),
                None => println!("No proposal {id}"),
            });
        }
        ProposalCommand::Count => {
            let result = service.get_proposal_count().await;
            return output.report("count proposals", &result, |count| {
                println!("Proposals: {count}");
            });
        }
        ProposalCommand::Create {
            id,
            description,
            inactive,
        } => {
            let proposal = CreateProposal {
                description,
                is_active: !inactive,
            };
            let result = service.create_proposal(&id, &proposal).await;
            let ok = output.report("create proposal", &result, |key| {
                println!("Created proposal {key}");
            })?;
            (ok, id)
        }
        ProposalCommand::Vote { id, choice } => {
            let result = service.vote(&id, choice).await;
            let ok = output.report("vote", &result, |_| {
                println!("Voted {} on proposal {id}", vote_label(choice));
            })?;
            (ok, id)
        }
        ProposalCommand::End { id } => {
            let result = service.end_proposal(&id).await;
            let ok = output.report("end proposal", &result, |_| {
                println!("Proposal {id} closed");
            })?;
            (ok, id)
        }
    };

    if changed {
        if let Ok(Some(proposal)) = service.get_proposal(&id).await {
            if !output.json {
                println!();
                print_lines(render_proposal(&id, &proposal));
            }
        }
    }
    Ok(changed)
}

fn vote_label(choice: Choice) -> &'static str {
    match choice {
        Choice::Approve => "approve",
        Choice::Reject => "reject",
        Choice::Pass => "pass",
    }
}
