//! Abstractions for page-number pagination.

/// Pagination arguments.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Arguments {
    /// Number of the requested page, starting from `1`.
    page: u32,

    /// Number of items on a single page.
    per_page: u32,
}

impl Arguments {
    /// Page returned when none (or a non-positive one) is requested.
    pub const DEFAULT_PAGE: u32 = 1;

    /// Page size used when none (or a non-positive one) is requested.
    pub const DEFAULT_PER_PAGE: u32 = 20;

    /// Creates new [`Arguments`].
    ///
    /// Absent and non-positive values fall back to [`DEFAULT_PAGE`] and
    /// `default_per_page` (or [`DEFAULT_PER_PAGE`] if it's zero).
    ///
    /// [`DEFAULT_PAGE`]: Self::DEFAULT_PAGE
    /// [`DEFAULT_PER_PAGE`]: Self::DEFAULT_PER_PAGE
    #[must_use]
    pub fn new<Num>(
        page: Option<Num>,
        per_page: Option<Num>,
        default_per_page: u32,
    ) -> Self
    where
        Num: TryInto<u32>,
    {
        fn positive<N: TryInto<u32>>(n: Option<N>) -> Option<u32> {
            n.and_then(|n| n.try_into().ok()).filter(|n| *n > 0)
        }

        let default_per_page = if default_per_page == 0 {
            Self::DEFAULT_PER_PAGE
        } else {
            default_per_page
        };
        Self {
            page: positive(page).unwrap_or(Self::DEFAULT_PAGE),
            per_page: positive(per_page).unwrap_or(default_per_page),
        }
    }

    /// Limits the page size of these [`Arguments`] to the provided `max`.
    #[must_use]
    pub fn with_max_per_page(self, max: u32) -> Self {
        Self {
            per_page: self.per_page.min(max.max(1)),
            ..self
        }
    }

    /// Returns the number of the requested page.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Returns the number of items on a single page.
    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Returns the number of items preceding the requested page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    /// Checks whether the requested page starts past the last of the
    /// `total_count` items.
    #[must_use]
    pub fn is_past_end(&self, total_count: u64) -> bool {
        self.offset() >= total_count
    }
}

impl Default for Arguments {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            per_page: Self::DEFAULT_PER_PAGE,
        }
    }
}

/// Single page of items.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Page<I> {
    /// Items on this [`Page`].
    pub items: Vec<I>,

    /// Total number of items on all pages.
    pub total_count: u64,

    /// Total number of pages.
    pub total_pages: u64,

    /// Number of this [`Page`], starting from `1`.
    pub current_page: u32,
}

impl<I> Page<I> {
    /// Creates a new [`Page`] out of the provided `items`.
    #[must_use]
    pub fn new(
        args: &Arguments,
        items: impl IntoIterator<Item = impl Into<I>>,
        total_count: u64,
    ) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            total_count,
            total_pages: total_count.div_ceil(u64::from(args.per_page)),
            current_page: args.page,
        }
    }
}

/// Pagination selector.
#[derive(Clone, Debug)]
pub struct Selector<F> {
    /// Pagination [`Arguments`].
    pub arguments: Arguments,

    /// Filter being applied before paginating.
    pub filter: F,
}

/// Defines pagination types.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_pagination {
    ($node:ty, $filter:ty) => {
        #[doc = concat!("Page of [`", stringify!($node), "`]s.")]
        pub type Page = $crate::pagination::Page<$node>;

        #[doc = "Arguments for selecting a [`Page`]."]
        pub type Arguments = $crate::pagination::Arguments;

        #[doc = "[`Page`] selector."]
        pub type Selector = $crate::pagination::Selector<$filter>;
    };
}

#[cfg(test)]
mod spec {
    use proptest::prelude::*;

    use super::{Arguments, Page};

    #[test]
    fn falls_back_to_defaults() {
        let args = Arguments::new::<i32>(None, None, 20);
        assert_eq!((args.page(), args.per_page()), (1, 20));

        let args = Arguments::new(Some(0), Some(-5), 20);
        assert_eq!((args.page(), args.per_page()), (1, 20));

        let args = Arguments::new(Some(-3), Some(0), 0);
        assert_eq!((args.page(), args.per_page()), (1, 20));

        let args = Arguments::new(Some(3), Some(7), 20);
        assert_eq!((args.page(), args.per_page()), (3, 7));
    }

    #[test]
    fn clamps_page_size() {
        let args = Arguments::new(Some(1), Some(500), 20).with_max_per_page(100);
        assert_eq!(args.per_page(), 100);

        let args = Arguments::new(Some(1), Some(5), 20).with_max_per_page(100);
        assert_eq!(args.per_page(), 5);
    }

    #[test]
    fn computes_offset() {
        assert_eq!(Arguments::new(Some(1), Some(20), 20).offset(), 0);
        assert_eq!(Arguments::new(Some(3), Some(20), 20).offset(), 40);
        assert!(!Arguments::new(Some(3), Some(20), 20).is_past_end(45));
        assert!(Arguments::new(Some(4), Some(15), 20).is_past_end(45));
    }

    #[test]
    fn counts_pages() {
        let args = Arguments::new(Some(1), Some(20), 20);
        assert_eq!(Page::<u8>::new(&args, Vec::<u8>::new(), 45).total_pages, 3);
        assert_eq!(Page::<u8>::new(&args, Vec::<u8>::new(), 40).total_pages, 2);
        assert_eq!(Page::<u8>::new(&args, Vec::<u8>::new(), 0).total_pages, 0);
        assert_eq!(Page::<u8>::new(&args, Vec::<u8>::new(), 1).total_pages, 1);
    }

    proptest! {
        #[test]
        fn pages_partition_items(total in 0_usize..200, per_page in 1_u32..50) {
            let items = (0..total).collect::<Vec<_>>();
            let first = Arguments::new(Some(1), Some(per_page), 20);
            let pages = Page::<usize>::new(&first, Vec::<usize>::new(), total as u64)
                .total_pages;

            let mut seen = Vec::with_capacity(total);
            for n in 1..=pages + 1 {
                let args = Arguments::new(Some(n), Some(u64::from(per_page)), 20);
                let offset = usize::try_from(args.offset()).unwrap();
                seen.extend(
                    items.iter().skip(offset).take(args.per_page() as usize),
                );
            }
            prop_assert_eq!(seen.into_iter().copied().collect::<Vec<_>>(), items);
        }
    }
}
