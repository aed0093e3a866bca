use std::{
    io::{self, Read, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{anyhow, Context};
use folio_client::{
    api::{Post, TopicId},
    display_content, find_orphans, thread_rows, OrphanPolicy, ThreadBuilder, ThreadedPost,
};

#[derive(structopt::StructOpt)]
struct Opt {
    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Print the reply tree of a topic
    Thread {
        /// JSON array of posts, `-` for stdin
        #[structopt(parse(from_os_str))]
        input: PathBuf,

        /// Only keep the posts of this topic
        #[structopt(long)]
        topic: Option<String>,

        /// Output format: tree, json (nested replies) or rows (flat, with depths)
        #[structopt(long, default_value = "tree")]
        format: Format,

        /// Show replies to missing posts as top-level posts instead of hiding them
        #[structopt(long)]
        promote_orphans: bool,
    },

    /// List posts replying to a post that is not in the input
    Orphans {
        /// JSON array of posts, `-` for stdin
        #[structopt(parse(from_os_str))]
        input: PathBuf,

        /// Only look at the posts of this topic
        #[structopt(long)]
        topic: Option<String>,
    },
}

#[derive(Debug, Eq, PartialEq)]
enum Format {
    Tree,
    Json,
    Rows,
}

impl FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Format> {
        match s {
            "tree" => Ok(Format::Tree),
            "json" => Ok(Format::Json),
            "rows" => Ok(Format::Rows),
            _ => Err(anyhow!("unknown format {s:?}, expected tree, json or rows")),
        }
    }
}

fn load_posts(input: &Path) -> anyhow::Result<Vec<Post>> {
    let data = if input == Path::new("-") {
        let mut data = String::new();
        io::stdin()
            .read_to_string(&mut data)
            .context("reading posts from stdin")?;
        data
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading posts from {input:?}"))?
    };
    serde_json::from_str(&data).with_context(|| format!("parsing posts from {input:?}"))
}

fn keep_valid(posts: Vec<Post>, topic: Option<&TopicId>) -> Vec<Post> {
    posts
        .into_iter()
        .filter(|p| topic.is_none() || p.topic_id.as_ref() == topic)
        .filter(|p| match p.validate() {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(post_id = %p.id, %err, "skipping invalid post");
                false
            }
        })
        .collect()
}

fn render_tree(out: &mut impl Write, forest: &[ThreadedPost]) -> io::Result<()> {
    for node in forest.iter().flat_map(|t| t.iter()) {
        let text = display_content(&node.post).lines().next().unwrap_or("");
        writeln!(
            out,
            "{:indent$}- [{}] {}: {}",
            "",
            node.post.id,
            node.post.author_id,
            text,
            indent = node.depth * 2,
        )?;
    }
    Ok(())
}

fn write_thread(
    out: &mut impl Write,
    posts: &[Post],
    format: &Format,
    policy: OrphanPolicy,
) -> anyhow::Result<()> {
    let forest = ThreadBuilder::new().orphans(policy).build(posts);
    tracing::info!(
        num_posts = posts.len(),
        num_threads = forest.len(),
        "built reply forest"
    );
    match format {
        Format::Tree => render_tree(out, &forest).context("writing tree")?,
        Format::Json => {
            serde_json::to_writer_pretty(&mut *out, &forest)
                .context("writing json, use --format rows for very deep threads")?;
            writeln!(out)?;
        }
        Format::Rows => {
            serde_json::to_writer_pretty(&mut *out, &thread_rows(&forest))
                .context("writing rows")?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn write_orphans(out: &mut impl Write, posts: &[Post]) -> io::Result<()> {
    for p in find_orphans(posts) {
        let parent = p.parent_id.as_ref().map(|id| id.0.as_str()).unwrap_or("");
        writeln!(out, "{}\t{}", p.id, parent)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let opt = <Opt as structopt::StructOpt>::from_args();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match opt.cmd {
        Command::Thread {
            input,
            topic,
            format,
            promote_orphans,
        } => {
            let topic = topic.map(TopicId);
            let posts = keep_valid(load_posts(&input)?, topic.as_ref());
            let policy = match promote_orphans {
                true => OrphanPolicy::Promote,
                false => OrphanPolicy::Drop,
            };
            write_thread(&mut out, &posts, &format, policy)?;
        }
        Command::Orphans { input, topic } => {
            let topic = topic.map(TopicId);
            let posts = keep_valid(load_posts(&input)?, topic.as_ref());
            write_orphans(&mut out, &posts).context("writing orphans")?;
        }
    }

    Ok(())
}
