use chrono::{Duration, Utc};
use folio_api::{Post, PostId, TopicId, UserId};
use rand::{seq::SliceRandom, Rng};

const NUM_USERS: usize = 8;
const NUM_TOPICS: usize = 3;
const NUM_POSTS_PER_TOPIC: usize = 60;

// Probability that a new post starts a new thread rather than replying
const TOP_LEVEL_RATIO: f64 = 0.2;
const DELETED_RATIO: f64 = 0.05;
const MODERATED_RATIO: f64 = 0.02;
const ORPHAN_RATIO: f64 = 0.02;

const CONTENT_WORD_COUNT: usize = 25;

fn gen_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn main() {
    let mut rng = rand::thread_rng();
    let users = (0..NUM_USERS)
        .map(|_| UserId(gen_id()))
        .collect::<Vec<_>>();

    let mut posts = Vec::new();
    for _ in 0..NUM_TOPICS {
        let topic = TopicId(gen_id());
        let mut date = Utc::now() - Duration::days(30);
        let mut topic_posts: Vec<PostId> = Vec::new();
        for _ in 0..NUM_POSTS_PER_TOPIC {
            let id = PostId(gen_id());
            let parent_id = if topic_posts.is_empty() || rng.gen_bool(TOP_LEVEL_RATIO) {
                None
            } else if rng.gen_bool(ORPHAN_RATIO) {
                // reply to a post that got hard-deleted upstream
                Some(PostId(gen_id()))
            } else {
                topic_posts.choose(&mut rng).cloned()
            };
            date = date + Duration::minutes(rng.gen_range(1..600));
            let author_id = users
                .choose(&mut rng)
                .cloned()
                .unwrap_or_else(UserId::stub);
            posts.push(Post {
                id: id.clone(),
                parent_id,
                topic_id: Some(topic.clone()),
                content: lipsum::lipsum_words(CONTENT_WORD_COUNT),
                author_id,
                created_at: date,
                is_deleted: rng.gen_bool(DELETED_RATIO),
                deleted_by_moderator: rng.gen_bool(MODERATED_RATIO),
            });
            topic_posts.push(id);
        }
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&posts).expect("serializing generated posts")
    );
}
