use std::collections::HashSet;

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use wordbook::engine::BookmarkSet;
use wordbook::engine::filter::{FilterOptions, filtered_words};
use wordbook::engine::progress::study_progress;
use wordbook::session::quiz::{OPTION_COUNT, generate_questions};
use wordbook::words::{Level, LevelFilter, Word};

fn arb_level() -> impl Strategy<Value = Level> {
    prop_oneof![Just(Level::Easy), Just(Level::Medium), Just(Level::Hard)]
}

fn arb_word() -> impl Strategy<Value = (String, String, String, Level, u32)> {
    (
        "[a-zA-Z]{1,8}",
        "[가-힣]{1,4}",
        "[a-z ]{0,12}",
        arb_level(),
        0u32..4,
    )
}

fn arb_words() -> impl Strategy<Value = Vec<Word>> {
    prop::collection::vec(arb_word(), 0..40).prop_map(|fields| {
        fields
            .into_iter()
            .enumerate()
            .map(|(i, (en, ko, example, level, studied))| {
                let mut word = Word::new(format!("word_{i}"), en, ko, level)
                    .with_example(example, String::new());
                word.study_count = studied;
                word
            })
            .collect()
    })
}

fn ids(words: &[&Word]) -> HashSet<String> {
    words.iter().map(|w| w.id.clone()).collect()
}

proptest! {
    #[test]
    fn blank_query_without_filters_keeps_every_word(words in arb_words()) {
        let result = filtered_words(&words, "  ", &FilterOptions::default(), &BookmarkSet::new());
        prop_assert_eq!(result.len(), words.len());
        prop_assert_eq!(ids(&result), words.iter().map(|w| w.id.clone()).collect());
    }

    #[test]
    fn every_search_hit_matches_the_query(
        words in arb_words(),
        query in "[a-zA-Z가-힣]{1,2}",
    ) {
        let hit = |w: &Word| {
            w.english.to_lowercase().contains(&query.to_lowercase())
                || w.korean.contains(&query)
                || w.example.contains(&query)
        };
        let result =
            filtered_words(&words, &query, &FilterOptions::default(), &BookmarkSet::new());
        for word in &result {
            prop_assert!(hit(*word));
        }
        let expected: HashSet<String> =
            words.iter().filter(|w| hit(*w)).map(|w| w.id.clone()).collect();
        prop_assert_eq!(ids(&result), expected);
    }

    #[test]
    fn level_and_bookmark_filters_are_subsets(
        words in arb_words(),
        marked in prop::collection::vec(0usize..40, 0..10),
    ) {
        let bookmarks: BookmarkSet = marked.iter().map(|i| format!("word_{i}")).collect();
        let options = FilterOptions {
            level: LevelFilter::Medium,
            bookmarked_only: true,
            ..FilterOptions::default()
        };
        for word in filtered_words(&words, "", &options, &bookmarks) {
            prop_assert_eq!(word.level, Level::Medium);
            prop_assert!(bookmarks.contains(&word.id));
        }
    }

    #[test]
    fn progress_stays_in_bounds(words in arb_words()) {
        let progress = study_progress(&words);
        prop_assert_eq!(progress.total, words.len());
        prop_assert!(progress.studied <= progress.total);
        prop_assert!(progress.percentage <= 100);
        if words.is_empty() {
            prop_assert_eq!(progress.percentage, 0);
        }
    }

    #[test]
    fn quiz_questions_have_four_distinct_options(
        n in 4usize..30,
        count in 1usize..15,
        seed in any::<u64>(),
    ) {
        let words: Vec<Word> = (0..n)
            .map(|i| {
                Word::new(format!("w{i}"), format!("word{i}"), format!("뜻{i}"), Level::Easy)
            })
            .collect();
        let mut rng = SmallRng::seed_from_u64(seed);
        let questions = generate_questions(&words, LevelFilter::All, count, &mut rng).unwrap();

        prop_assert_eq!(questions.len(), count.min(n));
        let asked: HashSet<&str> = questions.iter().map(|q| q.word.id.as_str()).collect();
        prop_assert_eq!(asked.len(), questions.len());
        for q in &questions {
            let unique: HashSet<&String> = q.options.iter().collect();
            prop_assert_eq!(unique.len(), OPTION_COUNT);
            prop_assert_eq!(q.options.iter().filter(|o| **o == q.correct_answer).count(), 1);
            prop_assert_eq!(&q.correct_answer, &q.word.korean);
        }
    }
}
