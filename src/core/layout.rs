//! Grid layout for the listing.
//!
//! Pure arithmetic: listing size and viewport in, grid geometry out. Entries fill a column
//! top to bottom, then the next column, then the next page, so an index maps to
//! (page, col, row) as a mixed-radix number and back.

/// Cells between two columns.
pub const COLUMN_PADDING: usize = 1;

/// Terminal area available to the grid, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub rows: usize,
    pub cols: usize,
}

impl Viewport {
    /// Lines used by the header, page indicator and prompt line.
    pub const CHROME_ROWS: usize = 3;

    /// Grid viewport for a terminal of the given size.
    pub fn for_terminal(term_rows: u16, term_cols: u16) -> Self {
        Viewport {
            rows: (term_rows as usize).saturating_sub(Self::CHROME_ROWS),
            cols: term_cols as usize,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport { rows: 21, cols: 80 }
    }
}

/// Position of an index inside the paged grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridPos {
    pub page: usize,
    pub col: usize,
    pub row: usize,
}

/// Grid geometry for one listing and viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    len: usize,
    rows: usize,
    cols: usize,
    pages: usize,
    cell_width: usize,
}

impl Default for GridLayout {
    fn default() -> Self {
        GridLayout::compute(0, Viewport::default(), 0)
    }
}

impl GridLayout {
    /// `entry_width` is the widest cell content (name plus marker plus detail column).
    pub fn compute(len: usize, viewport: Viewport, entry_width: usize) -> Self {
        let cols = (viewport.cols / (entry_width + COLUMN_PADDING)).max(1);
        let rows = viewport.rows.max(1);
        GridLayout {
            len,
            rows,
            cols,
            pages: len.div_ceil(rows * cols),
            cell_width: entry_width,
        }
    }

    // Accessors

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn pages(&self) -> usize {
        self.pages
    }

    #[inline]
    pub fn cell_width(&self) -> usize {
        self.cell_width
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.rows * self.cols
    }

    pub fn index_to_pos(&self, idx: usize) -> GridPos {
        let page_size = self.page_size();
        let within = idx % page_size;
        GridPos {
            page: idx / page_size,
            col: within / self.rows,
            row: within % self.rows,
        }
    }

    pub fn pos_to_index(&self, pos: GridPos) -> usize {
        pos.row + self.rows * (pos.col + self.cols * pos.page)
    }

    /// Range of indices shown on `page`.
    pub fn page_range(&self, page: usize) -> std::ops::Range<usize> {
        let start = (page * self.page_size()).min(self.len);
        let end = ((page + 1) * self.page_size()).min(self.len);
        start..end
    }

    fn on_last_page(&self, page: usize) -> bool {
        page + 1 >= self.pages
    }

    /// Number of columns holding an entry at `row` on `page`. Smaller than [Self::cols]
    /// only on a partial last page.
    pub fn cols_at(&self, page: usize, row: usize) -> usize {
        if !self.on_last_page(page) {
            return self.cols;
        }
        let remaining = self.len.saturating_sub(page * self.page_size());
        (remaining + self.rows - 1).saturating_sub(row) / self.rows
    }

    /// Number of rows filled in column `col` of `page`.
    pub fn rows_at(&self, page: usize, col: usize) -> usize {
        if !self.on_last_page(page) {
            return self.rows;
        }
        let remaining = self
            .len
            .saturating_sub(page * self.page_size())
            .saturating_sub(col * self.rows);
        remaining.min(self.rows)
    }
}
