use clap::{Parser, Subcommand};
use log::debug;
use movie_favorites::*;

#[derive(Parser)]
#[command(name = "movie-favorites")]
#[command(author, version, about = "Manage per-user movie favorites")]
struct Cli {
    /// Act as this user instead of the signed-in one
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store the signed-in user
    Login {
        #[arg(long)]
        username: String,
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Forget the signed-in user
    Logout,
    /// Print the signed-in user
    Whoami,
    /// Add a movie to the favorites
    Add {
        #[arg(long)]
        id: MovieId,
        #[arg(long)]
        title: String,
        #[arg(long)]
        poster_path: Option<String>,
        #[arg(long)]
        release_date: Option<String>,
        #[arg(long)]
        overview: Option<String>,
        #[arg(long = "genre")]
        genres: Vec<String>,
    },
    /// Add a movie given as a JSON object
    AddJson { json: String },
    /// Remove a movie from the favorites
    Remove { id: MovieId },
    /// Print the favorites as JSON
    List,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn run(cli: Cli, db: &sled::Db) -> CliResult {
    let stored = StoredSession::new(db);
    let session: Box<dyn SessionProvider + '_> = match cli.user {
        Some(user) => Box::new(UserIdentity::new(user)),
        None => Box::new(&stored),
    };
    let store = FavoritesStore::new(db, &*session);

    match cli.command {
        Command::Login { username, email } => {
            let user = SessionUser {
                username: Some(username),
                email,
                ..SessionUser::default()
            };
            stored.sign_in(&user)?;
            println!("Welcome back, {}!", user.display_name());
        }
        Command::Logout => {
            stored.sign_out()?;
            println!("Signed out");
        }
        Command::Whoami => match stored.current() {
            Some(user) => println!("Hello, {}", user.display_name()),
            None => println!("Not signed in"),
        },
        Command::Add {
            id,
            title,
            poster_path,
            release_date,
            overview,
            genres,
        } => {
            let mut movie = MovieRecord::new(id, title);
            movie.poster_path = poster_path;
            movie.release_date = release_date;
            movie.overview = overview;
            if !genres.is_empty() {
                movie.genres = Some(genres.into_iter().map(Genre::Name).collect());
            }
            add(&store, movie)?;
        }
        Command::AddJson { json } => {
            let movie: MovieRecord = serde_json::from_str(&json)?;
            add(&store, movie)?;
        }
        Command::Remove { id } => {
            if store.remove(&id)? {
                println!("Removed {} from favorites", id);
            } else {
                println!("{} is not in favorites", id);
            }
        }
        Command::List => {
            println!("{}", serde_json::to_string_pretty(&store.list())?);
        }
    }
    Ok(())
}

fn add<P: SessionProvider>(store: &FavoritesStore<&sled::Db, P>, movie: MovieRecord) -> CliResult {
    let title = movie.title.clone();
    match store.add(movie)? {
        AddOutcome::Added => println!("{} added to favorites!", title),
        AddOutcome::AlreadyPresent => println!("{} is already in favorites.", title),
    }
    Ok(())
}

fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("movie_favorites=info"),
    )
    .init();

    let cli = Cli::parse();
    let result = Config::from_env()
        .map_err(Box::<dyn std::error::Error>::from)
        .and_then(|config| {
            debug!("opening favorites db at {}", config.db_path.display());
            Ok(config.open()?)
        })
        .and_then(|db| run(cli, &db));

    if let Err(err) = result {
        debug!("{:?}", err);
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
