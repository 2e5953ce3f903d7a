use crate::model::Rect;

/// The five MaxRects placement heuristics. The page-size search driver tries
/// all of them at each candidate size and keeps the best result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxRectsHeuristic {
    BestShortSideFit,
    BestLongSideFit,
    BestAreaFit,
    BottomLeftRule,
    ContactPointRule,
}

pub const ALL_HEURISTICS: [MaxRectsHeuristic; 5] = [
    MaxRectsHeuristic::BestShortSideFit,
    MaxRectsHeuristic::BestLongSideFit,
    MaxRectsHeuristic::BestAreaFit,
    MaxRectsHeuristic::BottomLeftRule,
    MaxRectsHeuristic::ContactPointRule,
];

#[derive(Debug, Clone, Copy)]
struct FreeRect {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

impl FreeRect {
    fn right(&self) -> u32 {
        self.x + self.w
    }
    fn bottom(&self) -> u32 {
        self.y + self.h
    }
    fn contains(&self, o: &FreeRect) -> bool {
        o.x >= self.x && o.y >= self.y && o.right() <= self.right() && o.bottom() <= self.bottom()
    }
    fn intersects(&self, o: &FreeRect) -> bool {
        !(self.x >= o.right() || o.x >= self.right() || self.y >= o.bottom() || o.y >= self.bottom())
    }
}

/// A candidate placement found by a heuristic: where the rect would go, the
/// two tie-breaking scores, and whether it's the rotated footprint.
struct Candidate {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    rotated: bool,
    score1: i64,
    score2: i64,
}

/// Free-rectangle bin-packing engine for a single fixed-size page.
///
/// `used`/`free` are owned exclusively by one instance; nothing here is
/// shared across pages or threads.
pub struct MaxRects {
    width: u32,
    height: u32,
    used: Vec<FreeRect>,
    free: Vec<FreeRect>,
}

impl MaxRects {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            used: Vec::new(),
            free: vec![FreeRect { x: 0, y: 0, w: width, h: height }],
        }
    }

    fn score(&self, free: &FreeRect, w: u32, h: u32, heuristic: MaxRectsHeuristic) -> (i64, i64) {
        let dw = (free.w as i64 - w as i64).abs();
        let dh = (free.h as i64 - h as i64).abs();
        let short_fit = dw.min(dh);
        let long_fit = dw.max(dh);
        let area_fit = free.w as i64 * free.h as i64 - w as i64 * h as i64;
        match heuristic {
            MaxRectsHeuristic::BestShortSideFit => (short_fit, long_fit),
            MaxRectsHeuristic::BestLongSideFit => (long_fit, short_fit),
            MaxRectsHeuristic::BestAreaFit => (area_fit, short_fit),
            MaxRectsHeuristic::BottomLeftRule => ((free.y + h) as i64, free.x as i64),
            MaxRectsHeuristic::ContactPointRule => {
                (-(self.contact_point_score(free.x, free.y, w, h) as i64), area_fit)
            }
        }
    }

    fn contact_point_score(&self, x: u32, y: u32, w: u32, h: u32) -> u32 {
        let mut score = 0u32;
        if x == 0 {
            score += h;
        }
        if y == 0 {
            score += w;
        }
        if x + w == self.width {
            score += h;
        }
        if y + h == self.height {
            score += w;
        }
        for u in &self.used {
            if x == u.x + u.w || u.x == x + w {
                score += overlap_1d(y, y + h, u.y, u.y + u.h);
            }
            if y == u.y + u.h || u.y == y + h {
                score += overlap_1d(x, x + w, u.x, u.x + u.w);
            }
        }
        score
    }

    /// Finds the best free-rectangle candidate for a `w x h` footprint (and,
    /// if `allow_rotate`, its rotated `(rh, rw)` footprint too), scored by
    /// `heuristic`. Returns `None` if neither footprint fits anywhere.
    fn find_candidate(
        &self,
        w: u32,
        h: u32,
        rotated_w: u32,
        rotated_h: u32,
        allow_rotate: bool,
        heuristic: MaxRectsHeuristic,
    ) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        for free in &self.free {
            if free.w >= w && free.h >= h {
                let (s1, s2) = self.score(free, w, h, heuristic);
                if better(&best, s1, s2) {
                    best = Some(Candidate { x: free.x, y: free.y, w, h, rotated: false, score1: s1, score2: s2 });
                }
            }
            if allow_rotate && free.w >= rotated_w && free.h >= rotated_h {
                let (s1, s2) = self.score(free, rotated_w, rotated_h, heuristic);
                if better(&best, s1, s2) {
                    best = Some(Candidate {
                        x: free.x,
                        y: free.y,
                        w: rotated_w,
                        h: rotated_h,
                        rotated: true,
                        score1: s1,
                        score2: s2,
                    });
                }
            }
        }
        best
    }

    /// Places a single rect using the given heuristic. On success, mutates
    /// `rect.x`/`y`/`width`/`height`/`rotated` to its final page-space
    /// placement and returns `true`.
    pub fn insert(
        &mut self,
        rect: &mut Rect,
        heuristic: MaxRectsHeuristic,
        allow_rotate: bool,
        padding_x: u32,
        padding_y: u32,
    ) -> bool {
        let allow_rotate = allow_rotate && rect.can_rotate;
        let (rw, rh) = rect.rotated_footprint(padding_x, padding_y);
        match self.find_candidate(rect.width, rect.height, rw, rh, allow_rotate, heuristic) {
            None => false,
            Some(c) => {
                self.place(FreeRect { x: c.x, y: c.y, w: c.w, h: c.h });
                rect.x = c.x;
                rect.y = c.y;
                rect.width = c.w;
                rect.height = c.h;
                rect.rotated = c.rotated;
                true
            }
        }
    }

    /// Online best-fit loop (the default mode): repeatedly place whichever
    /// remaining rect currently has the lexicographically smallest
    /// `(score1, score2)`, until no remaining rect fits anywhere.
    pub fn pack(
        mut rects: Vec<Rect>,
        width: u32,
        height: u32,
        heuristic: MaxRectsHeuristic,
        allow_rotate: bool,
        padding_x: u32,
        padding_y: u32,
    ) -> (Vec<Rect>, Vec<Rect>) {
        let mut engine = MaxRects::new(width, height);
        let mut placed = Vec::new();

        loop {
            let mut best_idx = None;
            let mut best_candidate: Option<Candidate> = None;
            for (i, r) in rects.iter().enumerate() {
                let allow = allow_rotate && r.can_rotate;
                let (rw, rh) = r.rotated_footprint(padding_x, padding_y);
                if let Some(c) = engine.find_candidate(r.width, r.height, rw, rh, allow, heuristic) {
                    let replace = match &best_candidate {
                        None => true,
                        Some(b) => (c.score1, c.score2) < (b.score1, b.score2),
                    };
                    if replace {
                        best_idx = Some(i);
                        best_candidate = Some(c);
                    }
                }
            }
            match (best_idx, best_candidate) {
                (Some(i), Some(c)) => {
                    let mut r = rects.remove(i);
                    engine.place(FreeRect { x: c.x, y: c.y, w: c.w, h: c.h });
                    r.x = c.x;
                    r.y = c.y;
                    r.width = c.w;
                    r.height = c.h;
                    r.rotated = c.rotated;
                    placed.push(r);
                }
                _ => break,
            }
        }

        (placed, rects)
    }

    fn place(&mut self, node: FreeRect) {
        self.used.push(node);
        let mut new_free = Vec::new();
        let mut i = 0;
        while i < self.free.len() {
            let fr = self.free[i];
            if !fr.intersects(&node) {
                i += 1;
                continue;
            }
            self.free.swap_remove(i);
            split_free_node(fr, node, &mut new_free);
        }
        self.free.extend(new_free);
        self.prune_free_list();
    }

    fn prune_free_list(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let mut removed = false;
            let mut j = i + 1;
            while j < self.free.len() {
                if self.free[i].contains(&self.free[j]) {
                    self.free.remove(j);
                    continue;
                }
                if self.free[j].contains(&self.free[i]) {
                    self.free.remove(i);
                    removed = true;
                    break;
                }
                j += 1;
            }
            if !removed {
                i += 1;
            }
        }
    }
}

fn better(best: &Option<Candidate>, s1: i64, s2: i64) -> bool {
    match best {
        None => true,
        Some(b) => (s1, s2) < (b.score1, b.score2),
    }
}

fn overlap_1d(a1: u32, a2: u32, b1: u32, b2: u32) -> u32 {
    a2.min(b2).saturating_sub(a1.max(b1))
}

/// Guillotine-splits `free` by the axis-aligned bounds of `node` (the just
/// placed rect): up to four sub-rectangles (above/below/left/right of `node`
/// intersected with `free`) are produced. `free` itself is not pushed back.
fn split_free_node(free: FreeRect, node: FreeRect, out: &mut Vec<FreeRect>) {
    let ix1 = free.x.max(node.x);
    let iy1 = free.y.max(node.y);
    let ix2 = free.right().min(node.right());
    let iy2 = free.bottom().min(node.bottom());

    if iy1 > free.y {
        out.push(FreeRect { x: free.x, y: free.y, w: free.w, h: iy1 - free.y });
    }
    if iy2 < free.bottom() {
        out.push(FreeRect { x: free.x, y: iy2, w: free.w, h: free.bottom() - iy2 });
    }
    if ix1 > free.x {
        let h = iy2.saturating_sub(iy1);
        if h > 0 {
            out.push(FreeRect { x: free.x, y: iy1, w: ix1 - free.x, h });
        }
    }
    if ix2 < free.right() {
        let h = iy2.saturating_sub(iy1);
        if h > 0 {
            out.push(FreeRect { x: ix2, y: iy1, w: free.right() - ix2, h });
        }
    }
}
