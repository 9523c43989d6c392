use std::sync::Arc;

use book_feed::core::Library;
use book_feed::domain::model::{PurchaseLinks, UserBook};
use book_feed::domain::ports::BookCatalog;
use book_feed::utils::error::{BookFeedError, Result};
use book_feed::utils::{logger, validation::Validate};
use book_feed::{
    AppConfig, AuthClient, AuthSession, Book, BookStatus, CliConfig, Command, DiscoverySession,
    GoogleBooksClient, LibraryService, LocalStorage, SessionStore, SupabaseClient, TopicFeed,
};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting book-feed");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = cli.validate() {
        tracing::error!("❌ Invalid arguments: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli.command, config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        if e.is_transient() {
            eprintln!("🔁 This looks temporary, running the command again may work.");
        }

        let exit_code = e.exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

fn load_config(cli: &CliConfig) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.session_dir {
        config.session.dir = dir.clone();
    }
    config.validate()?;
    config.ensure_backend_credentials(!cfg!(debug_assertions))?;
    Ok(config)
}

async fn run(command: Command, config: AppConfig) -> Result<()> {
    let timeout = config.timeout();
    let catalog: Arc<dyn BookCatalog> = Arc::new(GoogleBooksClient::new(
        config.catalog.base_url.clone(),
        config.catalog.api_key.clone(),
        timeout,
    )?);
    let backend = Arc::new(SupabaseClient::new(
        config.backend.url.clone(),
        config.backend.anon_key.clone(),
        timeout,
    )?);

    let sessions = SessionStore::new(LocalStorage::new(config.session.dir.clone()));
    let session = sessions.restore().await;
    if let Some(session) = &session {
        tracing::debug!("Restored session for {}", session.user_id);
        backend.set_access_token(Some(session.access_token.clone()));
    }
    let library = LibraryService::new(backend.clone(), Arc::clone(&catalog), session.clone());

    match command {
        Command::Feed { count, like } => {
            let feed = TopicFeed::new(
                Arc::clone(&catalog),
                config.feed.topics.clone(),
                config.feed.batch_size,
            )
            .with_order_by(config.catalog.order_by.clone());

            let mut discovery = DiscoverySession::start_with_threshold(
                Arc::new(feed),
                backend.clone(),
                session.as_ref().map(|s| s.user_id),
                config.feed.prefetch_threshold,
            )
            .await;

            for n in 1..=count {
                let Some(book) = discovery.current().cloned() else {
                    println!("No more books to show.");
                    break;
                };
                print_book(n, &book);
                if like {
                    discovery.like().await;
                } else {
                    discovery.skip().await;
                }
            }
            discovery.flush().await;
        }
        Command::Search { query, max } => {
            let results = library.search_with_limit(&query, max).await?;
            if results.is_empty() {
                println!("No books found for '{}'", query);
            }
            for (n, book) in results.iter().enumerate() {
                println!("{:>2}. {} by {} [{}]", n + 1, book.title, book.author_display(), book.id);
            }
        }
        Command::Library => print_library(&library.fetch_library().await?),
        Command::Add {
            google_books_id,
            status,
        } => {
            let book = catalog.volume(&google_books_id).await?;
            let entry = library.add_book(&book, status).await?;
            println!("✅ Added '{}' to {} ({})", book.title, status.display_name(), entry.id);
            print_purchase_links(&book.purchase_links());
        }
        Command::Status {
            user_book_id,
            status,
        } => {
            library.update_status(user_book_id, status).await?;
            println!("✅ Moved {} to {}", user_book_id, status.display_name());
        }
        Command::Remove { user_book_id } => {
            library.remove(user_book_id).await?;
            println!("✅ Removed {}", user_book_id);
        }
        Command::Review {
            google_books_id,
            rating,
            text,
        } => {
            let review = library
                .save_review(&google_books_id, rating, text.as_deref())
                .await?;
            println!("✅ Saved {}★ review for {}", review.rating, review.google_books_id);
        }
        Command::Profile => {
            let profile = library.profile().await?;
            println!("{}", profile.display_name);
            println!("  Books read:      {}", profile.stats.books_read);
            println!("  Reviews written: {}", profile.stats.reviews_written);
            println!("  Total books:     {}", profile.stats.total_books);
        }
        Command::SignIn {
            id_token,
            provider,
            name,
        } => {
            let auth = AuthClient::new(
                config.backend.url.clone(),
                config.backend.anon_key.clone(),
                timeout,
            )?;
            let session = auth.exchange_id_token(&provider, &id_token, name).await?;
            let session = sessions.save(session).await?;
            println!(
                "✅ Signed in as {}",
                session.display_name.as_deref().unwrap_or_default()
            );
        }
        Command::DemoSignIn => {
            if !cfg!(debug_assertions) {
                return Err(BookFeedError::AuthError {
                    message: "demo sign-in is only available in debug builds".to_string(),
                });
            }
            sessions.save(AuthSession::demo()).await?;
            println!("✅ Signed in as the demo user");
        }
        Command::SignOut => {
            sessions.clear().await?;
            println!("✅ Signed out");
        }
    }

    Ok(())
}

fn print_book(n: usize, book: &Book) {
    println!("{:>2}. {}", n, book.title);
    println!("    {} · {}", book.author_display(), book.genre_display());
    println!("    ★ {} · {}", book.rating_display(), book.page_count_display());
    println!("    {}", book.hook());
}

fn print_purchase_links(links: &PurchaseLinks) {
    for (store, link) in [
        ("Amazon", &links.amazon),
        ("Apple Books", &links.apple_books),
        ("Bookshop", &links.bookshop),
    ] {
        if let Some(link) = link {
            println!("    {}: {}", store, link);
        }
    }
}

fn print_library(library: &Library) {
    if library.is_empty() {
        println!("Your library is empty.");
        return;
    }
    for status in BookStatus::ALL {
        let section = library.section(status);
        println!("{} ({})", status.display_name(), section.len());
        for entry in section {
            println!("  {}", describe_entry(entry));
        }
    }
}

fn describe_entry(entry: &UserBook) -> String {
    match &entry.book {
        Some(book) => format!("{} by {} [{}]", book.title, book.author_display(), entry.id),
        None => format!("{} [{}]", entry.google_books_id, entry.id),
    }
}
