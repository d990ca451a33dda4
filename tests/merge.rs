use yanomami_dataset::io::read_dataset;
use yanomami_dataset::processing::{self, dedup, duplicates};
use yanomami_dataset::record::{Conversation, KeyKind};

fn write_dataset(path: &std::path::Path, conversations: &[Conversation]) {
    let content: String = conversations
        .iter()
        .map(|c| serde_json::to_string(c).unwrap() + "\n")
        .collect();
    std::fs::write(path, content).unwrap();
}

fn conv(question: &str, answer: &str) -> Conversation {
    Conversation::new(question.to_string(), answer.to_string())
}

#[test]
fn merge_dataset_by_word() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("dataset.jsonl");
    let dst = dir.path().join("merged.jsonl");
    write_dataset(
        &src,
        &[
            conv("What does 'ahë' mean in Yanomami?", "A"),
            conv("How do you say hello?", "unkeyed"),
            conv("What does 'ahë' mean in Yanomami?", "B"),
        ],
    );

    processing::merge_file(&src, &dst, KeyKind::QuotedWord, processing::DEFAULT_SEPARATOR)
        .unwrap();
    let merged = read_dataset(&dst).unwrap();
    assert_eq!(merged.len(), 2);
    assert_eq!(
        merged[0].answer(),
        Some("A\n\n---\nAlternative interpretation:\n\nB")
    );
    assert_eq!(merged[1].answer(), Some("unkeyed"));

    // merging again changes nothing
    let again = dir.path().join("again.jsonl");
    processing::merge_file(&dst, &again, KeyKind::QuotedWord, processing::DEFAULT_SEPARATOR)
        .unwrap();
    assert_eq!(read_dataset(&again).unwrap(), merged);
}

#[test]
fn dedup_then_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("dataset.jsonl");
    let deduped = dir.path().join("deduped.jsonl");
    let repeated = dir.path().join("repeated.jsonl");
    let a = conv("What does 'ahë' mean in Yanomami?", "It means yours.");
    let a2 = conv("What does 'ahë' mean in Yanomami?", "It is a pronoun.");
    write_dataset(&src, &[a.clone(), a.clone(), a2.clone()]);

    assert_eq!(dedup::dedup_file(&src, &deduped).unwrap(), 1);
    assert_eq!(read_dataset(&deduped).unwrap(), vec![a, a2.clone()]);

    assert_eq!(
        duplicates::duplicates_file(&deduped, &repeated, KeyKind::QuotedWord).unwrap(),
        1
    );
    assert_eq!(read_dataset(&repeated).unwrap(), vec![a2]);
}
