//! Repository Integration Tests
//!
//! Tests for TagRepository with in-memory SQLite database.

#[cfg(test)]
mod tests {
    use crate::config::ArchiveConfig;
    use crate::domain::validation::{FORMAT_MESSAGE, TAKEN_MESSAGE};
    use crate::domain::{sort_by_name, DomainError, MessageCatalog, Tag, TagType, Taggable};
    use crate::repository::{
        init_db, DbState, Repository, ScopedRepository, TagField, TagRepository, TagScope,
        TaggingOperations, WranglingOperations,
    };
    use std::path::Path;
    use std::sync::Arc;

    async fn setup_test_repo() -> TagRepository {
        setup_with_config(&ArchiveConfig::default()).await
    }

    async fn setup_with_config(config: &ArchiveConfig) -> TagRepository {
        setup_test_db(config).await.1
    }

    async fn setup_test_db(config: &ArchiveConfig) -> (DbState, TagRepository) {
        // Use in-memory database for tests
        let db_state = init_db(Path::new(":memory:")).await.expect("Failed to init test DB");
        let repo = TagRepository::from_state(&db_state, config);
        (db_state, repo)
    }

    async fn create(repo: &TagRepository, name: &str, tag_type: TagType) -> Tag {
        repo.create(&Tag::new(name, tag_type)).await.expect("Failed to create")
    }

    async fn create_canonical(repo: &TagRepository, name: &str, tag_type: TagType) -> Tag {
        let mut tag = Tag::new(name, tag_type);
        tag.canonical = true;
        repo.create(&tag).await.expect("Failed to create")
    }

    fn names(tags: &[Tag]) -> Vec<&str> {
        tags.iter().map(|t| t.name.as_str()).collect()
    }

    fn messages(err: &DomainError) -> Vec<String> {
        err.validation_errors()
            .expect("expected a validation error")
            .on("name")
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    // ========================
    // Records and validation
    // ========================

    #[tokio::test]
    async fn test_create_tag() {
        let repo = setup_test_repo().await;

        let created = create(&repo, "Angst", TagType::Freeform).await;
        assert!(created.id > 0);
        assert!(created.is_unwrangled());

        let found = repo.find_by_id(created.id).await.expect("Find failed");
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn test_create_normalizes_name() {
        let repo = setup_test_repo().await;

        let created = create(&repo, "  Harry   Potter ", TagType::Fandom).await;
        assert_eq!(created.name, "Harry Potter");

        let stored = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Harry Potter");
    }

    #[tokio::test]
    async fn test_same_name_allowed_across_types_only() {
        let repo = setup_test_repo().await;

        create(&repo, "Angst", TagType::Freeform).await;
        create(&repo, "Angst", TagType::Genre).await;

        let err = repo.create(&Tag::new("Angst", TagType::Freeform)).await.unwrap_err();
        assert_eq!(messages(&err), vec![TAKEN_MESSAGE]);

        let err = repo.create(&Tag::new(" Angst  ", TagType::Freeform)).await.unwrap_err();
        assert_eq!(messages(&err), vec![TAKEN_MESSAGE]);

        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_uniqueness_is_case_sensitive() {
        let repo = setup_test_repo().await;

        create(&repo, "Angst", TagType::Freeform).await;
        create(&repo, "angst", TagType::Freeform).await;
    }

    #[tokio::test]
    async fn test_rejects_invalid_names() {
        let config = ArchiveConfig { tag_max: 10, ..ArchiveConfig::default() };
        let repo = setup_with_config(&config).await;

        let err = repo.create(&Tag::new("   ", TagType::Freeform)).await.unwrap_err();
        assert_eq!(err.validation_errors().unwrap().full_messages()[0], "Name can't be blank");

        let err = repo.create(&Tag::new("Much Too Long A Name", TagType::Freeform)).await.unwrap_err();
        assert_eq!(
            messages(&err),
            vec!["is too long -- try using less than 10 characters or using commas to separate your tags."]
        );

        let err = repo.create(&Tag::new("Kirk,Spock", TagType::Pairing)).await.unwrap_err();
        assert_eq!(messages(&err), vec![FORMAT_MESSAGE]);

        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_accepts_names_within_rules() {
        let repo = setup_test_repo().await;

        for name in ["Kirk/Spock", "Don't Stop Me Now!", "Alternate Universe - Coffee Shop", "Teen And Up (13+)"] {
            repo.create(&Tag::new(name, TagType::Freeform)).await.expect(name);
        }
        assert_eq!(repo.list().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_translated_validation_messages() {
        let mut catalog = MessageCatalog::new("de");
        catalog.add_translation(TAKEN_MESSAGE, "ist bereits vergeben");
        let repo = setup_test_repo().await.with_translator(Arc::new(catalog));

        create(&repo, "Fluff", TagType::Freeform).await;
        let err = repo.create(&Tag::new("Fluff", TagType::Freeform)).await.unwrap_err();
        assert_eq!(messages(&err), vec!["ist bereits vergeben"]);
    }

    #[tokio::test]
    async fn test_update_tag() {
        let repo = setup_test_repo().await;

        let mut tag = create(&repo, "Hurt/Comfort", TagType::Freeform).await;
        create(&repo, "Fluff", TagType::Freeform).await;

        tag.name = "Hurt/Comfort   (Lots)".to_string();
        tag.banned = true;
        let updated = repo.update(&tag).await.expect("Update failed");
        assert_eq!(updated.name, "Hurt/Comfort (Lots)");
        assert!(updated.banned);

        // Saving a tag under its own name is not a collision
        repo.update(&updated).await.expect("Resave failed");

        let mut clash = updated.clone();
        clash.name = "Fluff".to_string();
        let err = repo.update(&clash).await.unwrap_err();
        assert_eq!(messages(&err), vec![TAKEN_MESSAGE]);
    }

    #[tokio::test]
    async fn test_update_keeps_taggings_count() {
        let repo = setup_test_repo().await;

        let stale = create(&repo, "Friendship", TagType::Freeform).await;
        repo.add_tagging(stale.id, Taggable::Work(1)).await.unwrap();
        repo.add_tagging(stale.id, Taggable::Work(2)).await.unwrap();

        let updated = repo.update(&stale).await.unwrap();
        assert_eq!(updated.taggings_count, 2);
    }

    #[tokio::test]
    async fn test_update_unsaved_tag_rejected() {
        let repo = setup_test_repo().await;

        let err = repo.update(&Tag::new("Nowhere", TagType::Freeform)).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let repo = setup_test_repo().await;

        let genre = create(&repo, "Romance", TagType::Genre).await;
        create(&repo, "Romance", TagType::Freeform).await;

        let found = repo.find_by_name("Romance").await.unwrap().unwrap();
        assert_eq!(found.id, genre.id);
        assert!(repo.find_by_name("romance").await.unwrap().is_none());

        let freeform = repo.find_by_name_and_type("Romance", TagType::Freeform).await.unwrap().unwrap();
        assert_eq!(freeform.tag_type, TagType::Freeform);
    }

    #[tokio::test]
    async fn test_find_or_create_by_name() {
        let repo = setup_test_repo().await;

        let first = repo.find_or_create_by_name("Star  Trek", TagType::Fandom).await.unwrap();
        let second = repo.find_or_create_by_name(" Star Trek ", TagType::Fandom).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Star Trek");
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_field() {
        let repo = setup_test_repo().await;

        let tag = create(&repo, "Crack", TagType::Freeform).await;
        repo.update_field(tag.id, TagField::Banned(true)).await.unwrap();

        let stored = repo.find_by_id(tag.id).await.unwrap().unwrap();
        assert!(stored.banned);
        assert!(!stored.is_unwrangled());

        let err = repo.update_field(999, TagField::Canonical(true)).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    // ========================
    // Taggings
    // ========================

    #[tokio::test]
    async fn test_taggings_maintain_count() {
        let repo = setup_test_repo().await;

        let tag = create(&repo, "Drama", TagType::Genre).await;
        assert!(repo.add_tagging(tag.id, Taggable::Work(1)).await.unwrap());
        assert!(!repo.add_tagging(tag.id, Taggable::Work(1)).await.unwrap());
        assert!(repo.add_tagging(tag.id, Taggable::Bookmark(1)).await.unwrap());

        let stored = repo.find_by_id(tag.id).await.unwrap().unwrap();
        assert_eq!(stored.taggings_count, 2);

        assert!(repo.remove_tagging(tag.id, Taggable::Work(1)).await.unwrap());
        assert!(!repo.remove_tagging(tag.id, Taggable::Work(1)).await.unwrap());

        let stored = repo.find_by_id(tag.id).await.unwrap().unwrap();
        assert_eq!(stored.taggings_count, 1);
        assert!(repo.works_for(tag.id).await.unwrap().is_empty());
        assert_eq!(repo.bookmarks_for(tag.id).await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_tagging_unknown_tag() {
        let repo = setup_test_repo().await;

        let err = repo.add_tagging(42, Taggable::Work(1)).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_polymorphic_taggables() {
        let repo = setup_test_repo().await;

        let fandom = create(&repo, "Doctor Who", TagType::Fandom).await;
        let character = create(&repo, "The Doctor", TagType::Character).await;
        let media = create(&repo, "TV Shows", TagType::Media).await;

        repo.add_tagging(fandom.id, Taggable::Work(10)).await.unwrap();
        repo.add_tagging(character.id, Taggable::Work(10)).await.unwrap();
        repo.add_tagging(media.id, Taggable::Tag(fandom.id)).await.unwrap();

        let on_work = repo.tags_on(Taggable::Work(10)).await.unwrap();
        assert_eq!(names(&on_work), vec!["Doctor Who", "The Doctor"]);

        let tagged = repo.tags_for(media.id).await.unwrap();
        assert_eq!(names(&tagged), vec!["Doctor Who"]);

        let taggings = repo.taggings_for(media.id).await.unwrap();
        assert_eq!(taggings.len(), 1);
        assert_eq!(taggings[0].taggable, Taggable::Tag(fandom.id));
    }

    // ========================
    // Scopes
    // ========================

    #[tokio::test]
    async fn test_flag_scopes() {
        let repo = setup_test_repo().await;

        let plain = create(&repo, "Plain", TagType::Freeform).await;
        let canonical = create_canonical(&repo, "Canon", TagType::Freeform).await;
        let banned = create(&repo, "Banned", TagType::Freeform).await;
        repo.update_field(banned.id, TagField::Banned(true)).await.unwrap();
        let synonym = create(&repo, "Synonym", TagType::Freeform).await;
        repo.update_field(synonym.id, TagField::CanonicalId(Some(canonical.id))).await.unwrap();

        let valid = repo.scoped(&TagScope::all().valid()).await.unwrap();
        assert_eq!(names(&valid), vec!["Plain", "Canon", "Synonym"]);

        let banned_tags = repo.scoped(&TagScope::all().banned()).await.unwrap();
        assert_eq!(names(&banned_tags), vec!["Banned"]);

        let canonical_tags = repo.scoped(&TagScope::all().canonical()).await.unwrap();
        assert_eq!(names(&canonical_tags), vec!["Canon"]);

        let unwrangled = repo.scoped(&TagScope::all().unwrangled()).await.unwrap();
        assert_eq!(unwrangled.len(), 1);
        assert_eq!(unwrangled[0].id, plain.id);

        assert_eq!(repo.count(&TagScope::all()).await.unwrap(), 4);
        assert_eq!(repo.count(&TagScope::all().valid().canonical()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_by_category_and_fandom() {
        let repo = setup_test_repo().await;

        let trek = create_canonical(&repo, "Star Trek", TagType::Fandom).await;
        let wars = create_canonical(&repo, "Star Wars", TagType::Fandom).await;
        let mut kirk = Tag::new("James T. Kirk", TagType::Character);
        kirk.fandom_id = Some(trek.id);
        repo.create(&kirk).await.unwrap();
        let mut pairing = Tag::new("Kirk/Spock", TagType::Pairing);
        pairing.fandom_id = Some(trek.id);
        repo.create(&pairing).await.unwrap();
        let mut luke = Tag::new("Luke Skywalker", TagType::Character);
        luke.fandom_id = Some(wars.id);
        repo.create(&luke).await.unwrap();

        let characters = repo.scoped(&TagScope::all().by_category(&[TagType::Character])).await.unwrap();
        assert_eq!(names(&characters), vec!["James T. Kirk", "Luke Skywalker"]);

        let trek_tags = repo.scoped(&TagScope::all().by_fandom(&[trek.clone()])).await.unwrap();
        assert_eq!(names(&trek_tags), vec!["James T. Kirk", "Kirk/Spock"]);

        let trek_characters = repo
            .scoped(&TagScope::all().by_fandom(&[trek, wars]).by_category(&[TagType::Character]))
            .await
            .unwrap();
        assert_eq!(trek_characters.len(), 2);

        assert!(repo.scoped(&TagScope::all().by_fandom(&[])).await.unwrap().is_empty());
        assert!(repo.scoped(&TagScope::all().by_category(&[])).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_orderings() {
        let repo = setup_test_repo().await;

        let apple = create(&repo, "apple", TagType::Freeform).await;
        create(&repo, "Banana", TagType::Freeform).await;
        let cherry = create(&repo, "cherry", TagType::Freeform).await;
        for work in 1..=3 {
            repo.add_tagging(cherry.id, Taggable::Work(work)).await.unwrap();
        }
        repo.add_tagging(apple.id, Taggable::Work(1)).await.unwrap();

        let popular = repo.scoped(&TagScope::all().by_popularity()).await.unwrap();
        assert_eq!(names(&popular), vec!["cherry", "apple", "Banana"]);

        // Storage ordering is case-sensitive...
        let mut by_name = repo.scoped(&TagScope::all().ordered_by_name()).await.unwrap();
        assert_eq!(names(&by_name), vec!["Banana", "apple", "cherry"]);

        // ...the comparator is not
        sort_by_name(&mut by_name);
        assert_eq!(names(&by_name), vec!["apple", "Banana", "cherry"]);
    }

    #[tokio::test]
    async fn test_on_works_is_distinct() {
        let repo = setup_test_repo().await;

        let angst = create(&repo, "Angst", TagType::Freeform).await;
        let fluff = create(&repo, "Fluff", TagType::Freeform).await;
        let crack = create(&repo, "Crack", TagType::Freeform).await;
        repo.add_tagging(angst.id, Taggable::Work(1)).await.unwrap();
        repo.add_tagging(angst.id, Taggable::Work(2)).await.unwrap();
        repo.add_tagging(fluff.id, Taggable::Work(2)).await.unwrap();
        repo.add_tagging(crack.id, Taggable::Work(3)).await.unwrap();
        repo.add_tagging(crack.id, Taggable::Bookmark(1)).await.unwrap();

        let tags = repo.scoped(&TagScope::all().on_works(&[1, 2])).await.unwrap();
        assert_eq!(names(&tags), vec!["Angst", "Fluff"]);

        // Bookmark taggings share ids with works but are not works
        let tags = repo.scoped(&TagScope::all().on_works(&[1]).ordered_by_name()).await.unwrap();
        assert_eq!(names(&tags), vec!["Angst"]);

        assert!(repo.scoped(&TagScope::all().on_works(&[])).await.unwrap().is_empty());
    }

    // ========================
    // Wrangling
    // ========================

    #[tokio::test]
    async fn test_setup_canonical_is_idempotent() {
        let repo = setup_test_repo().await;

        let first = repo.setup_canonical("Harry Potter", TagType::Fandom).await.unwrap();
        let second = repo.setup_canonical("Harry Potter", TagType::Fandom).await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(second.canonical);

        let stored = repo.find_by_id(first.id).await.unwrap().unwrap();
        assert!(stored.canonical);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_setup_canonical_promotes_existing_tag() {
        let repo = setup_test_repo().await;

        let existing = create(&repo, "Sherlock", TagType::Fandom).await;
        let canonical = repo.setup_canonical("Sherlock", TagType::Fandom).await.unwrap();
        assert_eq!(canonical.id, existing.id);
        assert!(canonical.canonical);
    }

    #[tokio::test]
    async fn test_set_synonym_moves_works() {
        let repo = setup_test_repo().await;

        let mut hp = create(&repo, "HP", TagType::Fandom).await;
        let canonical = repo.setup_canonical("Harry Potter", TagType::Fandom).await.unwrap();
        repo.add_tagging(hp.id, Taggable::Work(1)).await.unwrap();
        repo.add_tagging(hp.id, Taggable::Work(2)).await.unwrap();
        repo.add_tagging(canonical.id, Taggable::Work(2)).await.unwrap();
        repo.add_tagging(hp.id, Taggable::Bookmark(7)).await.unwrap();

        assert!(repo.set_synonym(&mut hp, &canonical).await.unwrap());
        assert_eq!(hp.canonical_id, Some(canonical.id));

        let stored = repo.find_by_id(hp.id).await.unwrap().unwrap();
        assert_eq!(stored.canonical_id, Some(canonical.id));

        assert!(repo.works_for(hp.id).await.unwrap().is_empty());
        let mut works = repo.works_for(canonical.id).await.unwrap();
        works.sort();
        assert_eq!(works, vec![1, 2]);

        // Only works move
        assert_eq!(repo.bookmarks_for(hp.id).await.unwrap(), vec![7]);

        let stored_canonical = repo.find_by_id(canonical.id).await.unwrap().unwrap();
        assert_eq!(stored_canonical.taggings_count, 2);
        assert_eq!(stored.taggings_count, 1);

        assert_eq!(repo.synonym(&hp).await.unwrap().map(|t| t.id), Some(canonical.id));
        let synonyms = repo.synonyms(&canonical).await.unwrap();
        assert_eq!(names(&synonyms), vec!["HP"]);
    }

    #[tokio::test]
    async fn test_set_synonym_requires_canonical_target() {
        let repo = setup_test_repo().await;

        let mut tag = create(&repo, "Potter", TagType::Fandom).await;
        let other = create(&repo, "Harry Potter", TagType::Fandom).await;
        repo.add_tagging(tag.id, Taggable::Work(1)).await.unwrap();

        assert!(!repo.set_synonym(&mut tag, &other).await.unwrap());
        assert_eq!(tag.canonical_id, None);

        let stored = repo.find_by_id(tag.id).await.unwrap().unwrap();
        assert_eq!(stored.canonical_id, None);
        assert_eq!(repo.works_for(tag.id).await.unwrap(), vec![1]);
        assert!(repo.works_for(other.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_synonym_checks_stored_target() {
        let repo = setup_test_repo().await;

        let mut tag = create(&repo, "Potter", TagType::Fandom).await;
        let mut stale = create(&repo, "Harry Potter", TagType::Fandom).await;
        stale.canonical = true;

        assert!(!repo.set_synonym(&mut tag, &stale).await.unwrap());
        assert_eq!(tag.canonical_id, None);
    }

    #[tokio::test]
    async fn test_set_synonym_to_itself_refused() {
        let repo = setup_test_repo().await;

        let canonical = repo.setup_canonical("Merlin (TV)", TagType::Fandom).await.unwrap();
        repo.add_tagging(canonical.id, Taggable::Work(3)).await.unwrap();

        let mut same = canonical.clone();
        assert!(!repo.set_synonym(&mut same, &canonical).await.unwrap());
        assert_eq!(repo.works_for(canonical.id).await.unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn test_redirect_to_itself_keeps_works() {
        let repo = setup_test_repo().await;

        let tag = create(&repo, "Loop", TagType::Freeform).await;
        repo.add_tagging(tag.id, Taggable::Work(1)).await.unwrap();

        let err = repo.update_field(tag.id, TagField::CanonicalId(Some(tag.id))).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        let mut looped = tag.clone();
        looped.canonical_id = Some(tag.id);
        let err = repo.update(&looped).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        // A stale in-memory copy still must not drop the works
        assert!(!repo.reassign_to_canonical(&looped).await.unwrap());
        assert_eq!(repo.works_for(tag.id).await.unwrap(), vec![1]);

        let stored = repo.find_by_id(tag.id).await.unwrap().unwrap();
        assert_eq!(stored.canonical_id, None);
        assert_eq!(stored.taggings_count, 1);
    }

    #[tokio::test]
    async fn test_links_to_missing_tags_not_found() {
        let repo = setup_test_repo().await;

        let tag = create(&repo, "Dangling", TagType::Character).await;

        let err = repo.update_field(tag.id, TagField::CanonicalId(Some(999))).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        let err = repo.update_field(tag.id, TagField::FandomId(Some(999))).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        let mut orphan = Tag::new("Orphan", TagType::Character);
        orphan.fandom_id = Some(999);
        let err = repo.create(&orphan).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        let stored = repo.find_by_id(tag.id).await.unwrap().unwrap();
        assert_eq!(stored.canonical_id, None);
        assert_eq!(stored.fandom_id, None);
    }

    #[tokio::test]
    async fn test_reassign_without_canonical() {
        let repo = setup_test_repo().await;

        let tag = create(&repo, "Loose", TagType::Freeform).await;
        repo.add_tagging(tag.id, Taggable::Work(1)).await.unwrap();

        assert!(!repo.reassign_to_canonical(&tag).await.unwrap());
        assert_eq!(repo.works_for(tag.id).await.unwrap(), vec![1]);
        assert!(repo.synonym(&tag).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reassign_picks_up_new_works() {
        let repo = setup_test_repo().await;

        let mut tag = create(&repo, "SPN", TagType::Fandom).await;
        let canonical = repo.setup_canonical("Supernatural", TagType::Fandom).await.unwrap();
        repo.set_synonym(&mut tag, &canonical).await.unwrap();

        // A work tagged with the synonym after wrangling
        repo.add_tagging(tag.id, Taggable::Work(9)).await.unwrap();
        assert!(repo.reassign_to_canonical(&tag).await.unwrap());
        assert_eq!(repo.works_for(canonical.id).await.unwrap(), vec![9]);
        assert!(repo.works_for(tag.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_fandom_from_first_work() {
        let repo = setup_test_repo().await;

        let trek = create_canonical(&repo, "Star Trek", TagType::Fandom).await;
        let tos = create_canonical(&repo, "Star Trek: TOS", TagType::Fandom).await;
        let mut spock = create(&repo, "Spock", TagType::Character).await;
        repo.add_tagging(spock.id, Taggable::Work(4)).await.unwrap();
        repo.add_tagging(trek.id, Taggable::Work(4)).await.unwrap();
        repo.add_tagging(tos.id, Taggable::Work(4)).await.unwrap();

        assert!(repo.update_fandom(&mut spock).await.unwrap());
        assert_eq!(spock.fandom_id, Some(trek.id));

        let stored = repo.find_by_id(spock.id).await.unwrap().unwrap();
        assert_eq!(stored.fandom_id, Some(trek.id));
        assert_eq!(repo.fandom(&stored).await.unwrap().map(|f| f.name), Some("Star Trek".to_string()));

        // Already set
        assert!(!repo.update_fandom(&mut spock).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_fandom_lookup_failure_leaves_fandom_unset() {
        let (db_state, repo) = setup_test_db(&ArchiveConfig::default()).await;

        let mut spock = create(&repo, "Spock", TagType::Character).await;
        {
            let conn = db_state.connection();
            let conn = conn.lock().await;
            conn.execute_batch("DROP TABLE taggings;").unwrap();
        }

        assert!(!repo.update_fandom(&mut spock).await.unwrap());
        assert_eq!(spock.fandom_id, None);

        let stored = repo.find_by_id(spock.id).await.unwrap().unwrap();
        assert_eq!(stored.fandom_id, None);
    }

    #[tokio::test]
    async fn test_update_fandom_without_fandom() {
        let repo = setup_test_repo().await;

        let mut lonely = create(&repo, "Original Character", TagType::Character).await;
        assert!(!repo.update_fandom(&mut lonely).await.unwrap());

        let freeform = create(&repo, "Angst", TagType::Freeform).await;
        repo.add_tagging(lonely.id, Taggable::Work(5)).await.unwrap();
        repo.add_tagging(freeform.id, Taggable::Work(5)).await.unwrap();

        assert!(!repo.update_fandom(&mut lonely).await.unwrap());
        assert_eq!(lonely.fandom_id, None);
        assert!(repo.fandom(&lonely).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_first_fandom_of_work() {
        let repo = setup_test_repo().await;

        let fandom = create(&repo, "Good Omens", TagType::Fandom).await;
        let rating = create(&repo, "General Audiences", TagType::Rating).await;
        repo.add_tagging(rating.id, Taggable::Work(8)).await.unwrap();
        repo.add_tagging(fandom.id, Taggable::Work(8)).await.unwrap();

        let found = repo.first_fandom_of_work(8).await.unwrap();
        assert_eq!(found.map(|t| t.id), Some(fandom.id));
        assert!(repo.first_fandom_of_work(99).await.unwrap().is_none());
    }
}
