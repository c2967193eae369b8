//! Hitbox derivation and overlap tests
//!
//! Every entity kind maps to a reduced axis-aligned box: tree trunks occupy
//! the lower-center band of the sprite, rock cores shave the outer 10%, and
//! players inset their sprite box on all four sides. Bullets are points.
//! Pond membership is a normalized elliptical distance with two thresholds,
//! one for the surface and a tighter one for the deep zone.

use crate::game::constants::{hitbox, pond};
use crate::game::objects::{Lake, Pond, Rock, Tree};
use crate::util::vec2::Vec2;

/// Axis-aligned bounding box, position at top-left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Standard interval-overlap test on both axes
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Collidable trunk band of a tree sprite
pub fn tree_hitbox(tree: &Tree) -> Aabb {
    Aabb::new(
        tree.position.x + tree.size * hitbox::TREE_X_MIN,
        tree.position.y + tree.size * hitbox::TREE_Y_MIN,
        tree.size * hitbox::TREE_WIDTH,
        tree.size * hitbox::TREE_HEIGHT,
    )
}

/// Collidable core of a rock sprite
pub fn rock_hitbox(rock: &Rock) -> Aabb {
    Aabb::new(
        rock.position.x + rock.size * hitbox::ROCK_MIN,
        rock.position.y + rock.size * hitbox::ROCK_MIN,
        rock.size * hitbox::ROCK_EXTENT,
        rock.size * hitbox::ROCK_EXTENT,
    )
}

/// Player collision box: sprite box inset on all four sides
pub fn player_hitbox(position: Vec2, size: f32, inset: f32) -> Aabb {
    Aabb::new(
        position.x + inset,
        position.y + inset,
        size - 2.0 * inset,
        size - 2.0 * inset,
    )
}

/// Full sprite box, used for bullet-vs-player tests
pub fn sprite_box(position: Vec2, size: f32) -> Aabb {
    Aabb::new(position.x, position.y, size, size)
}

/// True when the box overlaps any tree trunk or rock core
pub fn collides_any_obstacle(aabb: &Aabb, trees: &[Tree], rocks: &[Rock]) -> bool {
    trees.iter().any(|t| aabb.overlaps(&tree_hitbox(t)))
        || rocks.iter().any(|r| aabb.overlaps(&rock_hitbox(r)))
}

/// True when the point lies inside any tree trunk or rock core
pub fn point_in_any_obstacle(point: Vec2, trees: &[Tree], rocks: &[Rock]) -> bool {
    trees.iter().any(|t| tree_hitbox(t).contains_point(point))
        || rocks.iter().any(|r| rock_hitbox(r).contains_point(point))
}

/// Normalized elliptical distance of a point from a pond center:
/// `(dx/rx)^2 + (dy/ry)^2`
fn ellipse_metric(point: Vec2, center: Vec2, rx: f32, ry: f32) -> f32 {
    if rx <= 0.0 || ry <= 0.0 {
        return f32::INFINITY;
    }
    let dx = (point.x - center.x) / rx;
    let dy = (point.y - center.y) / ry;
    dx * dx + dy * dy
}

/// Point is inside the pond surface ellipse
pub fn in_pond_surface(point: Vec2, p: &Pond) -> bool {
    let (rx, ry) = p.half_extents();
    ellipse_metric(point, p.center(), rx, ry) < pond::SURFACE_THRESHOLD
}

/// Point is inside the pond deep zone, where items may not spawn.
/// Tighter than the surface test; the thresholds must stay distinct.
pub fn in_deep_zone(point: Vec2, p: &Pond) -> bool {
    let (rx, ry) = p.half_extents();
    ellipse_metric(point, p.center(), rx, ry) < pond::DEEP_ZONE_THRESHOLD
}

/// Point is inside the deep zone of any pond
pub fn in_any_deep_zone(point: Vec2, ponds: &[Pond]) -> bool {
    ponds.iter().any(|p| in_deep_zone(point, p))
}

/// Bounding rectangle of a pond, optionally grown by a buffer on each side
pub fn pond_rect(p: &Pond, buffer: f32) -> Aabb {
    Aabb::new(
        p.position.x - buffer,
        p.position.y - buffer,
        p.width + 2.0 * buffer,
        p.height + 2.0 * buffer,
    )
}

/// Bounding rectangle of a decorative lake with a buffer
pub fn lake_rect(l: &Lake, buffer: f32) -> Aabb {
    Aabb::new(
        l.position.x - buffer,
        l.position.y - buffer,
        l.width + 2.0 * buffer,
        l.height + 2.0 * buffer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_at(x: f32, y: f32, size: f32) -> Tree {
        Tree {
            id: 1,
            position: Vec2::new(x, y),
            size,
        }
    }

    fn rock_at(x: f32, y: f32, size: f32) -> Rock {
        Rock {
            id: 2,
            position: Vec2::new(x, y),
            size,
        }
    }

    fn pond_at(x: f32, y: f32, w: f32, h: f32) -> Pond {
        Pond {
            id: 3,
            position: Vec2::new(x, y),
            width: w,
            height: h,
        }
    }

    #[test]
    fn test_aabb_overlap() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(5.0, 5.0, 10.0, 10.0);
        let c = Aabb::new(20.0, 20.0, 5.0, 5.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_aabb_touching_edges_do_not_overlap() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_tree_trunk_band() {
        // Size 100 tree at origin: trunk x in [20, 80], y in [50, 100]
        let tree = tree_at(0.0, 0.0, 100.0);
        let hb = tree_hitbox(&tree);
        assert_eq!(hb, Aabb::new(20.0, 50.0, 60.0, 50.0));

        // Canopy is not collidable
        assert!(!hb.contains_point(Vec2::new(50.0, 20.0)));
        // Trunk is
        assert!(hb.contains_point(Vec2::new(50.0, 75.0)));
    }

    #[test]
    fn test_rock_core() {
        let rock = rock_at(0.0, 0.0, 50.0);
        let hb = rock_hitbox(&rock);
        assert_eq!(hb, Aabb::new(5.0, 5.0, 40.0, 40.0));
    }

    #[test]
    fn test_player_hitbox_inset() {
        let hb = player_hitbox(Vec2::new(100.0, 100.0), 50.0, 10.0);
        assert_eq!(hb, Aabb::new(110.0, 110.0, 30.0, 30.0));
    }

    #[test]
    fn test_collides_any_obstacle() {
        let trees = vec![tree_at(0.0, 0.0, 100.0)];
        let rocks = vec![rock_at(500.0, 500.0, 50.0)];

        // Overlapping the trunk
        let hit = Aabb::new(40.0, 60.0, 20.0, 20.0);
        assert!(collides_any_obstacle(&hit, &trees, &rocks));

        // In the canopy band only
        let miss = Aabb::new(40.0, 10.0, 20.0, 20.0);
        assert!(!collides_any_obstacle(&miss, &trees, &rocks));
    }

    #[test]
    fn test_pond_surface_vs_deep_zone() {
        // 200x100 pond centered at (100, 50): rx=100, ry=50
        let p = pond_at(0.0, 0.0, 200.0, 100.0);

        let center = Vec2::new(100.0, 50.0);
        assert!(in_pond_surface(center, &p));
        assert!(in_deep_zone(center, &p));

        // 80% of the way out along x: inside surface, outside deep zone
        let shallow = Vec2::new(180.0, 50.0);
        assert!(in_pond_surface(shallow, &p));
        assert!(!in_deep_zone(shallow, &p));

        // Just outside the ellipse on the long axis
        let outside = Vec2::new(201.0, 50.0);
        assert!(!in_pond_surface(outside, &p));
    }

    #[test]
    fn test_deep_zone_boundary_is_seventy_percent() {
        let p = pond_at(0.0, 0.0, 200.0, 100.0);
        // 69% of rx from center: inside the deep zone
        assert!(in_deep_zone(Vec2::new(169.0, 50.0), &p));
        // 71% of rx: outside the deep zone but inside the surface
        let edge = Vec2::new(171.0, 50.0);
        assert!(!in_deep_zone(edge, &p));
        assert!(in_pond_surface(edge, &p));
    }

    #[test]
    fn test_pond_rect_buffer() {
        let p = pond_at(100.0, 100.0, 200.0, 100.0);
        let r = pond_rect(&p, 10.0);
        assert_eq!(r, Aabb::new(90.0, 90.0, 220.0, 120.0));
    }

    #[test]
    fn test_degenerate_pond_contains_nothing() {
        let p = pond_at(0.0, 0.0, 0.0, 0.0);
        assert!(!in_pond_surface(Vec2::new(0.0, 0.0), &p));
        assert!(!in_deep_zone(Vec2::new(0.0, 0.0), &p));
    }
}
