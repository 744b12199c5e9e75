use super::{DRAG_N_DROP, ImageAttributes, ImageId, SkipReason, SortDirection, SortKey, SortOutcome};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

pub type AttributeMap = HashMap<ImageId, ImageAttributes>;

/// Source of per-image attributes, usually the attachment store.
pub trait AttributeLookup {
    fn attributes(&self, id: ImageId) -> Option<ImageAttributes>;
}

impl AttributeLookup for AttributeMap {
    fn attributes(&self, id: ImageId) -> Option<ImageAttributes> {
        self.get(&id).cloned()
    }
}

/// Look up every image once so the comparator never touches the store.
pub fn prefetch_attributes<L>(images: &[ImageId], lookup: &L) -> AttributeMap
where
    L: AttributeLookup + ?Sized,
{
    images
        .iter()
        .map(|&id| (id, lookup.attributes(id).unwrap_or_default()))
        .collect()
}

pub fn sort_images(images: &[ImageId], key: SortKey, attributes: &AttributeMap) -> Vec<ImageId> {
    let mut sorted = images.to_vec();

    match key {
        SortKey::DragNDrop => {}
        SortKey::Filename(direction) => sorted.sort_by(|a, b| {
            direction.apply(compare_filenames(
                &attributes_of(attributes, a).filename,
                &attributes_of(attributes, b).filename,
            ))
        }),
        SortKey::ShootDate(direction) => {
            sort_by_timestamp(&mut sorted, attributes, direction, |a| a.shoot_timestamp)
        }
        SortKey::FileDate(direction) => {
            sort_by_timestamp(&mut sorted, attributes, direction, |a| a.file_timestamp)
        }
        SortKey::UploadDate(direction) => {
            sort_by_timestamp(&mut sorted, attributes, direction, |a| a.upload_timestamp)
        }
    }

    sorted
}

static NO_ATTRIBUTES: ImageAttributes = ImageAttributes {
    filename: String::new(),
    shoot_timestamp: 0,
    file_timestamp: 0,
    upload_timestamp: 0,
};

fn attributes_of<'a>(attributes: &'a AttributeMap, id: &ImageId) -> &'a ImageAttributes {
    attributes.get(id).unwrap_or(&NO_ATTRIBUTES)
}

// slice::sort_by is stable, and reversing the comparator (not the output)
// keeps ties in their original order for descending keys too.
fn sort_by_timestamp(
    images: &mut [ImageId],
    attributes: &AttributeMap,
    direction: SortDirection,
    field: fn(&ImageAttributes) -> i64,
) {
    images.sort_by(|a, b| {
        direction.apply(field(attributes_of(attributes, a)).cmp(&field(attributes_of(attributes, b))))
    });
}

/// ASCII case-insensitive comparison, byte by byte.
pub fn compare_filenames(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

pub fn apply_sort_selection<L>(
    images: &[ImageId],
    previous: Option<&str>,
    new: &str,
    lookup: &L,
) -> SortOutcome
where
    L: AttributeLookup + ?Sized,
{
    if new == DRAG_N_DROP {
        return SortOutcome::Skipped(SkipReason::ManualOrder);
    }
    if previous == Some(new) {
        return SortOutcome::Skipped(SkipReason::Unchanged);
    }
    if images.is_empty() {
        return SortOutcome::Skipped(SkipReason::EmptyGallery);
    }

    let key = SortKey::parse(new);
    debug!("Sorting {} images by {} (requested '{}')", images.len(), key, new);

    let attributes = prefetch_attributes(images, lookup);
    SortOutcome::Sorted(sort_images(images, key, &attributes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[i64]) -> Vec<ImageId> {
        raw.iter().copied().map(ImageId).collect()
    }

    fn with_filenames(entries: &[(i64, &str)]) -> AttributeMap {
        entries
            .iter()
            .map(|(id, name)| {
                (
                    ImageId(*id),
                    ImageAttributes {
                        filename: name.to_string(),
                        ..Default::default()
                    },
                )
            })
            .collect()
    }

    fn with_shoot_dates(entries: &[(i64, i64)]) -> AttributeMap {
        entries
            .iter()
            .map(|(id, ts)| {
                (
                    ImageId(*id),
                    ImageAttributes {
                        shoot_timestamp: *ts,
                        ..Default::default()
                    },
                )
            })
            .collect()
    }

    fn is_permutation(a: &[ImageId], b: &[ImageId]) -> bool {
        let mut a = a.to_vec();
        let mut b = b.to_vec();
        a.sort();
        b.sort();
        a == b
    }

    #[test]
    fn test_filename_ascending() {
        let attributes = with_filenames(&[(5, "c.jpg"), (3, "a.jpg"), (9, "b.jpg")]);
        let sorted = sort_images(
            &ids(&[5, 3, 9]),
            SortKey::Filename(SortDirection::Asc),
            &attributes,
        );
        assert_eq!(sorted, ids(&[3, 9, 5]));
    }

    #[test]
    fn test_filename_descending_is_case_insensitive() {
        let attributes = with_filenames(&[(1, "b.JPG"), (2, "A.jpg"), (3, "c.jpg")]);
        let sorted = sort_images(
            &ids(&[1, 2, 3]),
            SortKey::Filename(SortDirection::Desc),
            &attributes,
        );
        assert_eq!(sorted, ids(&[3, 1, 2]));
    }

    #[test]
    fn test_missing_shoot_date_sorts_last_descending() {
        let attributes = with_shoot_dates(&[(1, 0), (2, 100)]);
        let sorted = sort_images(
            &ids(&[1, 2]),
            SortKey::ShootDate(SortDirection::Desc),
            &attributes,
        );
        assert_eq!(sorted, ids(&[2, 1]));
    }

    #[test]
    fn test_missing_attributes_sort_first_ascending() {
        // Image 7 has no attributes at all and is treated as timestamp 0
        let attributes = with_shoot_dates(&[(1, 50), (2, 10)]);
        let sorted = sort_images(
            &ids(&[1, 2, 7]),
            SortKey::ShootDate(SortDirection::Asc),
            &attributes,
        );
        assert_eq!(sorted, ids(&[7, 2, 1]));
    }

    #[test]
    fn test_sort_is_stable_in_both_directions() {
        let attributes = with_shoot_dates(&[(1, 10), (2, 20), (3, 10), (4, 20)]);
        let input = ids(&[1, 2, 3, 4]);

        let asc = sort_images(&input, SortKey::ShootDate(SortDirection::Asc), &attributes);
        assert_eq!(asc, ids(&[1, 3, 2, 4]));

        let desc = sort_images(&input, SortKey::ShootDate(SortDirection::Desc), &attributes);
        assert_eq!(desc, ids(&[2, 4, 1, 3]));
    }

    #[test]
    fn test_drag_n_drop_keeps_order() {
        let attributes = with_filenames(&[(5, "c.jpg"), (3, "a.jpg")]);
        assert_eq!(
            sort_images(&ids(&[5, 3]), SortKey::DragNDrop, &attributes),
            ids(&[5, 3])
        );
        assert!(sort_images(&[], SortKey::DragNDrop, &attributes).is_empty());
    }

    #[test]
    fn test_unknown_key_is_a_no_op() {
        assert_eq!(SortKey::parse("random_order"), SortKey::DragNDrop);
        assert_eq!(SortKey::parse(""), SortKey::DragNDrop);
        assert!("random_order".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_every_key_returns_a_permutation() {
        let mut attributes = AttributeMap::new();
        for (id, name, ts) in [(4, "d.jpg", 3), (1, "B.jpg", 9), (8, "a.jpg", 3), (2, "c.jpg", 0)] {
            attributes.insert(
                ImageId(id),
                ImageAttributes {
                    filename: name.to_string(),
                    shoot_timestamp: ts,
                    file_timestamp: ts * 2,
                    upload_timestamp: 100 - ts,
                },
            );
        }
        let input = ids(&[4, 1, 8, 2]);

        for key in SortKey::ALL {
            let sorted = sort_images(&input, key, &attributes);
            assert!(is_permutation(&input, &sorted), "{} lost or duplicated ids", key);
        }
    }

    #[test]
    fn test_key_strings_round_trip() {
        for key in SortKey::ALL {
            assert_eq!(SortKey::parse(key.as_str()), key);
        }
    }

    #[test]
    fn test_prefetch_defaults_missing_images() {
        let lookup = with_filenames(&[(1, "a.jpg")]);
        let prefetched = prefetch_attributes(&ids(&[1, 2]), &lookup);
        assert_eq!(prefetched.len(), 2);
        assert_eq!(prefetched[&ImageId(2)], ImageAttributes::default());
    }

    #[test]
    fn test_first_selection_sorts() {
        let lookup = with_filenames(&[(2, "a.jpg"), (1, "b.jpg")]);
        assert_eq!(
            apply_sort_selection(&ids(&[1, 2]), None, "filename_asc", &lookup),
            SortOutcome::Sorted(ids(&[2, 1]))
        );
        assert_eq!(
            apply_sort_selection(&ids(&[1, 2]), None, "drag_n_drop", &lookup),
            SortOutcome::Skipped(SkipReason::ManualOrder)
        );
    }

    #[test]
    fn test_apply_sort_selection_skips() {
        let lookup = with_filenames(&[(2, "a.jpg"), (1, "b.jpg")]);
        let images = ids(&[1, 2]);

        assert_eq!(
            apply_sort_selection(&images, Some("filename_asc"), "drag_n_drop", &lookup),
            SortOutcome::Skipped(SkipReason::ManualOrder)
        );
        assert_eq!(
            apply_sort_selection(&images, Some("filename_asc"), "filename_asc", &lookup),
            SortOutcome::Skipped(SkipReason::Unchanged)
        );
        assert_eq!(
            apply_sort_selection(&[], None, "filename_asc", &lookup),
            SortOutcome::Skipped(SkipReason::EmptyGallery)
        );
        assert_eq!(
            apply_sort_selection(&images, Some("drag_n_drop"), "filename_asc", &lookup),
            SortOutcome::Sorted(ids(&[2, 1]))
        );
    }
}
